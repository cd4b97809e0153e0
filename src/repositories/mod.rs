mod models;

use std::collections::{BTreeMap, BTreeSet};
use std::ops::ControlFlow;

use crate::dataset::{DatasetSource, Record, fields};

pub use models::CategoryGroup; // Re-export the model type to callers.

/// Read-only queries over the recipe dataset.
///
/// Each query makes its own pass over the source, so there is nothing to
/// invalidate when the dataset is replaced. String comparisons are done on
/// lowercased values on both sides, except for [`RecipeRepository::find_by_id`].
/// An empty query string answers with an empty result without reading the
/// dataset at all.
pub struct RecipeRepository<S> {
    source: S,
}

impl<S: DatasetSource> RecipeRepository<S> {
    pub fn new(source: S) -> Self {
        Self { source }
    }

    #[allow(unused)]
    pub fn source(&self) -> &S {
        &self.source
    }

    /// Distinct lowercased categories, sorted.
    pub fn list_categories(&self) -> Vec<String> {
        let mut categories = BTreeSet::new();
        self.each(|record| {
            if let Some(category) = record.lowered(fields::CATEGORY) {
                categories.insert(category);
            }
        });
        categories.into_iter().collect()
    }

    /// Every category with its sorted sub-categories. Categories without any
    /// sub-category are listed with an empty list.
    pub fn list_categories_with_subcategories(&self) -> Vec<CategoryGroup> {
        let mut groups: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
        self.each(|record| {
            let Some(category) = record.lowered(fields::CATEGORY) else {
                return;
            };
            let subcategories = groups.entry(category).or_default();
            if let Some(subcategory) = record.lowered(fields::SUB_CATEGORY) {
                subcategories.insert(subcategory);
            }
        });

        groups
            .into_iter()
            .map(|(category, subcategories)| {
                CategoryGroup::new(category, subcategories.into_iter().collect())
            })
            .collect()
    }

    /// Distinct lowercased sub-categories of one category, sorted.
    pub fn list_subcategories(&self, category: &str) -> Vec<String> {
        if category.is_empty() {
            return Vec::new();
        }
        let wanted = category.to_lowercase();

        let mut subcategories = BTreeSet::new();
        self.each(|record| {
            if record.lowered(fields::CATEGORY).as_deref() == Some(wanted.as_str())
                && let Some(subcategory) = record.lowered(fields::SUB_CATEGORY)
            {
                subcategories.insert(subcategory);
            }
        });
        subcategories.into_iter().collect()
    }

    /// Recipes of a category, optionally narrowed to one sub-category.
    pub fn find_by_category(&self, category: &str, subcategory: Option<&str>) -> Vec<Record> {
        if category.is_empty() {
            return Vec::new();
        }
        let category = category.to_lowercase();
        let subcategory = subcategory.filter(|s| !s.is_empty()).map(str::to_lowercase);

        self.filter(|record| {
            record.lowered(fields::CATEGORY).as_deref() == Some(category.as_str())
                && match &subcategory {
                    None => true,
                    Some(wanted) => record.lowered(fields::SUB_CATEGORY).as_ref() == Some(wanted),
                }
        })
    }

    /// Recipes carrying `tag` (whole tag, any case).
    pub fn find_by_tag(&self, tag: &str) -> Vec<Record> {
        if tag.is_empty() {
            return Vec::new();
        }
        let wanted = tag.to_lowercase();
        self.filter(|record| record.tags().any(|t| t.to_lowercase() == wanted))
    }

    /// Recipes whose name contains `query`.
    pub fn find_by_name(&self, query: &str) -> Vec<Record> {
        self.find_containing(fields::NAME, query)
    }

    /// Recipes whose dependency coordinates contain `query`.
    pub fn find_by_dependency(&self, query: &str) -> Vec<Record> {
        self.find_containing(fields::DEPENDENCY, query)
    }

    /// First recipe with exactly this id, or the empty record.
    pub fn find_by_id(&self, id: &str) -> Record {
        if id.is_empty() {
            return Record::default();
        }

        let mut found = None;
        self.source.scan(&mut |record| {
            if record.id() == Some(id) {
                found = Some(record);
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(())
            }
        });
        found.unwrap_or_default()
    }

    fn find_containing(&self, field: &str, query: &str) -> Vec<Record> {
        if query.is_empty() {
            return Vec::new();
        }
        let needle = query.to_lowercase();
        self.filter(|record| {
            record
                .lowered(field)
                .is_some_and(|value| value.contains(&needle))
        })
    }

    fn each(&self, mut f: impl FnMut(&Record)) {
        self.source.scan(&mut |record| {
            f(&record);
            ControlFlow::Continue(())
        });
    }

    fn filter(&self, keep: impl Fn(&Record) -> bool) -> Vec<Record> {
        let mut out = Vec::new();
        self.source.scan(&mut |record| {
            if keep(&record) {
                out.push(record);
            }
            ControlFlow::Continue(())
        });
        out
    }
}
