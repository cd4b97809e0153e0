use serde::{Deserialize, Serialize};

/// A category together with every sub-category seen under it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryGroup {
    pub(crate) category: String,
    #[serde(rename = "sub-categories")]
    pub(crate) subcategories: Vec<String>,
}

#[allow(unused)]
impl CategoryGroup {
    pub fn new(category: impl Into<String>, subcategories: Vec<String>) -> Self {
        Self {
            category: category.into(),
            subcategories,
        }
    }

    // Borrowing getters (no clones).
    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn subcategories(&self) -> &[String] {
        &self.subcategories
    }
}
