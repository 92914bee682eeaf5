//! Interprets what the verification portal rendered.
//!
//! Every selector and the rejection phrase live here. The portal is an
//! unversioned HTML surface, so a markup change on its side should only ever
//! require edits to this file. A sustained rise in [`Classification::Timeout`]
//! is the usual symptom of such a change (see [`crate::verify::monitor`]).

use crate::error::{Error, Result};
use scraper::{ElementRef, Html, Selector};
use url::Url;

/// Input field that receives the product identifier.
pub const IDENTIFIER_INPUT: &str = r#"input[name="qrcode"]"#;

/// Control that submits the lookup form.
pub const SUBMIT_CONTROL: &str = "#locationsubmit";

/// Element that appears when the portal knows the product.
pub const RESULTS_TABLE: &str = "table";

/// Element that carries the rejection message.
pub const REJECTION_HEADING: &str = "h3";

/// Exact heading text the portal shows for counterfeit or unregistered
/// products.
pub const REJECTION_PHRASE: &str = "This is not a Genuine Product !";

const ROW: &str = "tr";
const CELL: &str = "td, th";
const IMAGE: &str = "img[src]";

/// What the driver saw after submitting an identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Observation {
    /// Neither marker appeared within the race timeout.
    TimedOut,
    /// At least one marker appeared.
    Rendered {
        /// Text of the rejection heading, if it was read.
        heading: Option<String>,
        /// Outer HTML of the results table, if one was present.
        table_html: Option<String>,
    },
}

/// Decision over an [`Observation`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    /// The portal declared the product not genuine.
    Invalid,
    /// The results table had at least one usable row.
    ValidWithData {
        /// Usable rows, cells trimmed and non-empty.
        rows: Vec<Vec<String>>,
        /// First image inside the table.
        image_url: Option<String>,
    },
    /// A table was shown but had nothing usable in it.
    ValidNoData {
        /// First image inside the table.
        image_url: Option<String>,
    },
    /// No marker appeared in time.
    Timeout,
}

impl Classification {
    /// Whether this outcome may be cached.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Timeout)
    }
}

/// Whether heading text is the portal's rejection message.
///
/// Comparison is case-sensitive after trimming.
#[must_use]
pub fn is_rejection(heading: &str) -> bool {
    heading.trim() == REJECTION_PHRASE
}

/// Classify an observation.
///
/// Relative image references are resolved against `base` when given.
///
/// # Errors
///
/// Returns [`Error::Extraction`] if the table markup cannot be queried.
pub fn classify(observation: &Observation, base: Option<&Url>) -> Result<Classification> {
    let (heading, table_html) = match observation {
        Observation::TimedOut => return Ok(Classification::Timeout),
        Observation::Rendered {
            heading,
            table_html,
        } => (heading, table_html),
    };

    if heading.as_deref().is_some_and(is_rejection) {
        return Ok(Classification::Invalid);
    }

    let Some(html) = table_html else {
        return Ok(Classification::ValidNoData { image_url: None });
    };

    let table = extract_table(html, base)?;
    if table.rows.is_empty() {
        Ok(Classification::ValidNoData {
            image_url: table.image_url,
        })
    } else {
        Ok(Classification::ValidWithData {
            rows: table.rows,
            image_url: table.image_url,
        })
    }
}

/// Rows and image pulled out of the results table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedTable {
    /// Rows with at least two non-empty cells.
    pub rows: Vec<Vec<String>>,
    /// First image reference in the table.
    pub image_url: Option<String>,
}

/// Extract usable rows and the first image from table markup.
///
/// # Errors
///
/// Returns [`Error::Extraction`] if a selector fails to compile.
pub fn extract_table(html: &str, base: Option<&Url>) -> Result<ExtractedTable> {
    let fragment = Html::parse_fragment(html);
    let row_selector = selector(ROW)?;
    let cell_selector = selector(CELL)?;
    let image_selector = selector(IMAGE)?;

    let rows = fragment
        .select(&row_selector)
        .map(|row| {
            row.select(&cell_selector)
                .map(cell_text)
                .filter(|text| !text.is_empty())
                .collect::<Vec<_>>()
        })
        .filter(|cells| cells.len() >= 2)
        .collect();

    let image_url = fragment
        .select(&image_selector)
        .filter_map(|img| img.value().attr("src"))
        .map(str::trim)
        .find(|src| !src.is_empty())
        .map(|src| resolve(src, base));

    Ok(ExtractedTable { rows, image_url })
}

fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| Error::Extraction(format!("bad selector {css:?}: {e}")))
}

fn cell_text(cell: ElementRef<'_>) -> String {
    cell.text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

fn resolve(src: &str, base: Option<&Url>) -> String {
    base.and_then(|b| b.join(src).ok())
        .map_or_else(|| src.to_string(), String::from)
}
