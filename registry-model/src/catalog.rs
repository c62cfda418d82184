use crate::error::{ModelError, ModelResult};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Named code lists that string fields can draw their choices from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CatalogList {
    /// Item classification schemes (the keys of the code table).
    ItemSchemes,
    IdentifierSchemes,
    DocumentTypes,
    AdditionalSchemes,
}

/// Reference data used during validation.
///
/// The built-in set is small; deployments replace it with a JSON file of the
/// same shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Catalogs {
    /// Scheme → allowed classification codes.
    pub item_classifications: BTreeMap<String, BTreeSet<String>>,
    pub identifier_schemes: Vec<String>,
    pub document_types: Vec<String>,
    pub additional_schemes: Vec<String>,
}

pub const DEFAULT_ITEM_CLASSIFICATION: &str = "CAV";
pub const DEFAULT_CURRENCY: &str = "UAH";

const CAV_CODES: &[&str] = &[
    "04000000-8",
    "04100000-9",
    "04110000-2",
    "04120000-5",
    "05000000-5",
    "06000000-2",
    "06100000-3",
    "06110000-6",
    "06120000-9",
    "07000000-9",
    "08000000-6",
    "34100000-8",
    "39513200-3",
];

const IDENTIFIER_SCHEMES: &[&str] = &[
    "UA-EDR", "UA-IPN", "UA-FIN", "UA-MFO", "GB-COH", "GB-CHC", "US-EIN", "XI-IATI",
];

const DOCUMENT_TYPES: &[&str] = &[
    "notice",
    "technicalSpecifications",
    "illustration",
    "virtualDataRoom",
    "x_presentation",
];

const ADDITIONAL_SCHEMES: &[&str] = &["ДКПП", "NONE", "CPVS"];

impl Catalogs {
    pub fn builtin() -> Self {
        let owned = |items: &[&str]| items.iter().map(|s| (*s).to_string()).collect::<Vec<_>>();
        Self {
            item_classifications: BTreeMap::from([(
                DEFAULT_ITEM_CLASSIFICATION.to_string(),
                CAV_CODES.iter().map(|s| (*s).to_string()).collect(),
            )]),
            identifier_schemes: owned(IDENTIFIER_SCHEMES),
            document_types: owned(DOCUMENT_TYPES),
            additional_schemes: owned(ADDITIONAL_SCHEMES),
        }
    }

    /// Parses catalogs from JSON.
    pub fn from_json(raw: &str) -> ModelResult<Self> {
        let catalogs: Self =
            serde_json::from_str(raw).map_err(|e| ModelError::Catalog(e.to_string()))?;
        if catalogs.item_classifications.is_empty() {
            return Err(ModelError::Catalog(
                "item_classifications must define at least one scheme".into(),
            ));
        }
        Ok(catalogs)
    }

    /// Allowed codes for a classification scheme.
    pub fn codes(&self, scheme: &str) -> Option<&BTreeSet<String>> {
        self.item_classifications.get(scheme)
    }

    /// Resolves a named list to its values.
    pub fn list(&self, list: CatalogList) -> Vec<String> {
        match list {
            CatalogList::ItemSchemes => self.item_classifications.keys().cloned().collect(),
            CatalogList::IdentifierSchemes => self.identifier_schemes.clone(),
            CatalogList::DocumentTypes => self.document_types.clone(),
            CatalogList::AdditionalSchemes => self.additional_schemes.clone(),
        }
    }
}

impl Default for Catalogs {
    fn default() -> Self {
        Self::builtin()
    }
}
