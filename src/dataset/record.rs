use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Field names used by the recipe dataset.
#[allow(unused)]
pub mod fields {
    pub const ID: &str = "id";
    pub const NAME: &str = "name";
    pub const DESCRIPTION: &str = "description";
    pub const CATEGORY: &str = "category";
    pub const SUB_CATEGORY: &str = "sub-category";
    pub const TAGS: &str = "tags";
    pub const DEPENDENCY: &str = "dependency";
    pub const PACKAGE: &str = "package";
    pub const MVN_COMMAND_LINE: &str = "mvn-command-line";
    pub const LINK: &str = "link";
}

/// One recipe as found in the dataset.
///
/// The dataset is produced outside this tool and never schema-checked, so the
/// record keeps the raw JSON object and exposes typed getters on top of it. A
/// field holding a value of the wrong type reads exactly like a missing field.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record(Map<String, Value>);

#[allow(unused)]
impl Record {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    /// Keep JSON objects, reject every other kind of value.
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(fields) => Some(Self(fields)),
            _ => None,
        }
    }

    /// The empty record doubles as the "not found" answer of id lookups.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_fields(self) -> Map<String, Value> {
        self.0
    }

    /// Borrow a field if it holds a string.
    pub fn text(&self, field: &str) -> Option<&str> {
        self.0.get(field).and_then(Value::as_str)
    }

    /// Lowercased string value of a field, see [`lowered`].
    pub fn lowered(&self, field: &str) -> Option<String> {
        lowered(self.0.get(field))
    }

    /// String elements of `tags`; anything else in the array is skipped.
    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.0
            .get(fields::TAGS)
            .and_then(Value::as_array)
            .into_iter()
            .flatten()
            .filter_map(Value::as_str)
    }

    pub fn id(&self) -> Option<&str> {
        self.text(fields::ID)
    }

    pub fn name(&self) -> Option<&str> {
        self.text(fields::NAME)
    }

    pub fn category(&self) -> Option<&str> {
        self.text(fields::CATEGORY)
    }

    pub fn sub_category(&self) -> Option<&str> {
        self.text(fields::SUB_CATEGORY)
    }

    pub fn dependency(&self) -> Option<&str> {
        self.text(fields::DEPENDENCY)
    }
}

impl From<Record> for Value {
    fn from(record: Record) -> Self {
        Value::Object(record.0)
    }
}

/// Lowercase a JSON value if it is a non-empty string.
///
/// Every comparison in the query layer goes through this helper so that
/// absent, null, empty and wrongly typed values are all handled the same way.
pub fn lowered(value: Option<&Value>) -> Option<String> {
    value
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_lowercase)
}
