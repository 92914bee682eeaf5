//! Turns the portal's result rows into promoted fields and a residual map.

use std::collections::BTreeMap;

/// Attribute data extracted from the results table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizedAttributes {
    /// Value of the last row labelled as an authorized user.
    pub authorized_distributor: Option<String>,
    /// Value of the last row labelled as an artisan or weaver.
    pub artisan: Option<String>,
    /// Every other row, keyed by its label as the portal wrote it.
    pub attributes: BTreeMap<String, String>,
}

/// Normalize table rows.
///
/// Rows with fewer than two cells, or with an empty label or value, are
/// skipped. Labels are matched case-insensitively but stored with their
/// original casing. Later rows overwrite earlier ones, for promoted fields
/// and residual keys alike.
#[must_use]
pub fn normalize<S: AsRef<str>>(rows: &[Vec<S>]) -> NormalizedAttributes {
    let mut out = NormalizedAttributes::default();

    for row in rows {
        let (Some(label), Some(value)) = (row.first(), row.get(1)) else {
            continue;
        };
        let (label, value) = (label.as_ref(), value.as_ref());
        if label.is_empty() || value.is_empty() {
            continue;
        }

        let lowered = label.to_lowercase();
        if is_authorized_user(&lowered) {
            out.authorized_distributor = Some(value.to_string());
        } else if is_artisan(&lowered) {
            out.artisan = Some(value.to_string());
        } else {
            out.attributes.insert(label.to_string(), value.to_string());
        }
    }

    out
}

/// "authorized ... user", in that order.
fn is_authorized_user(label: &str) -> bool {
    const AUTHORIZED: &str = "authorized";
    label
        .find(AUTHORIZED)
        .is_some_and(|at| label[at + AUTHORIZED.len()..].contains("user"))
}

fn is_artisan(label: &str) -> bool {
    label.contains("artisan") || label.contains("weaver")
}
