//! Verification result types.

use crate::verify::classifier::Classification;
use crate::verify::normalizer::{normalize, NormalizedAttributes};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Outcome of verifying one product identifier.
///
/// An invalid result never carries attribute data: `attributes` is empty and
/// both promoted fields are `None`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationResult {
    /// Identifier that was looked up.
    pub product_id: String,
    /// True only when the portal explicitly declared the product not genuine.
    pub invalid: bool,
    /// Representative image shown by the portal, if any.
    pub image_url: Option<String>,
    /// Rows that were not promoted, keyed by their original label.
    pub attributes: BTreeMap<String, String>,
    /// Authorized user / distributor of the GI tag.
    pub authorized_distributor: Option<String>,
    /// Artisan or weaver credited with the product.
    pub artisan: Option<String>,
}

impl VerificationResult {
    /// Result for a product the portal rejected.
    #[must_use]
    pub fn rejected(product_id: impl Into<String>) -> Self {
        Self {
            product_id: product_id.into(),
            invalid: true,
            image_url: None,
            attributes: BTreeMap::new(),
            authorized_distributor: None,
            artisan: None,
        }
    }

    /// Result for a product the portal recognised.
    #[must_use]
    pub fn genuine(
        product_id: impl Into<String>,
        image_url: Option<String>,
        normalized: NormalizedAttributes,
    ) -> Self {
        Self {
            product_id: product_id.into(),
            invalid: false,
            image_url,
            attributes: normalized.attributes,
            authorized_distributor: normalized.authorized_distributor,
            artisan: normalized.artisan,
        }
    }

    /// Shape a terminal classification into a result.
    ///
    /// Returns `None` for [`Classification::Timeout`], which is not terminal.
    #[must_use]
    pub fn from_classification(
        product_id: impl Into<String>,
        classification: Classification,
    ) -> Option<Self> {
        match classification {
            Classification::Invalid => Some(Self::rejected(product_id)),
            Classification::ValidWithData { rows, image_url } => {
                Some(Self::genuine(product_id, image_url, normalize(&rows)))
            }
            Classification::ValidNoData { image_url } => Some(Self::genuine(
                product_id,
                image_url,
                NormalizedAttributes::default(),
            )),
            Classification::Timeout => None,
        }
    }

    /// Whether the portal supplied any attribute data for this product.
    #[must_use]
    pub fn has_data(&self) -> bool {
        !self.attributes.is_empty()
            || self.authorized_distributor.is_some()
            || self.artisan.is_some()
    }
}
