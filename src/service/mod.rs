use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use crate::dataset::{DatasetSource, Record, sidecar_path};
use crate::repositories::{CategoryGroup, RecipeRepository};
use crate::updater::{RemoteSource, RemoteUpdater, UpdateError};

/// Where `update_database` downloads from and installs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateTarget {
    pub dataset_url: String,
    pub checksum_url: String,
    pub dest_dir: PathBuf,
}

/// Result of `update_database`, shaped for adapters that print JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateOutcome {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub json_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sha256_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl UpdateOutcome {
    fn installed(json_path: &Path) -> Self {
        Self {
            success: true,
            json_path: Some(json_path.display().to_string()),
            sha256_path: Some(sidecar_path(json_path).display().to_string()),
            error: None,
        }
    }

    fn failed(message: String) -> Self {
        Self {
            success: false,
            json_path: None,
            sha256_path: None,
            error: Some(message),
        }
    }
}

/// Boundary between the adapters (CLI, tools) and the repository/updater.
///
/// Arguments are trimmed; missing or blank arguments produce the empty answer
/// straight away. Query methods never fail and `update_database` reports
/// failures inside its [`UpdateOutcome`].
pub struct RecipeService<S, R> {
    repository: RecipeRepository<S>,
    updater: RemoteUpdater<R>,
    target: UpdateTarget,
}

/// Trimmed argument, or `None` when there is nothing left.
fn argument(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|s| !s.is_empty())
}

impl<S: DatasetSource, R: RemoteSource> RecipeService<S, R> {
    pub fn new(
        repository: RecipeRepository<S>,
        updater: RemoteUpdater<R>,
        target: UpdateTarget,
    ) -> Self {
        Self {
            repository,
            updater,
            target,
        }
    }

    #[allow(unused)]
    pub fn repository(&self) -> &RecipeRepository<S> {
        &self.repository
    }

    pub fn list_categories(&self) -> Vec<String> {
        self.repository.list_categories()
    }

    pub fn list_categories_with_subcategories(&self) -> Vec<CategoryGroup> {
        self.repository.list_categories_with_subcategories()
    }

    pub fn list_subcategories(&self, category: Option<&str>) -> Vec<String> {
        match argument(category) {
            Some(category) => self.repository.list_subcategories(category),
            None => Vec::new(),
        }
    }

    pub fn find_by_category(
        &self,
        category: Option<&str>,
        subcategory: Option<&str>,
    ) -> Vec<Record> {
        match argument(category) {
            Some(category) => self.repository.find_by_category(category, argument(subcategory)),
            None => Vec::new(),
        }
    }

    pub fn find_by_tag(&self, tag: Option<&str>) -> Vec<Record> {
        match argument(tag) {
            Some(tag) => self.repository.find_by_tag(tag),
            None => Vec::new(),
        }
    }

    pub fn find_by_name(&self, query: Option<&str>) -> Vec<Record> {
        match argument(query) {
            Some(query) => self.repository.find_by_name(query),
            None => Vec::new(),
        }
    }

    pub fn find_by_dependency(&self, query: Option<&str>) -> Vec<Record> {
        match argument(query) {
            Some(query) => self.repository.find_by_dependency(query),
            None => Vec::new(),
        }
    }

    pub fn find_by_id(&self, id: Option<&str>) -> Record {
        match argument(id) {
            Some(id) => self.repository.find_by_id(id),
            None => Record::default(),
        }
    }

    /// Refresh the local dataset from the configured remote copy.
    pub async fn update_database(&self) -> UpdateOutcome {
        let UpdateTarget {
            dataset_url,
            checksum_url,
            dest_dir,
        } = &self.target;
        debug!(
            %dataset_url,
            %checksum_url,
            dest_dir = %dest_dir.display(),
            "updating recipes database"
        );

        match self.updater.update(dataset_url, checksum_url, dest_dir).await {
            Ok(path) => {
                info!(path = %path.display(), "update finished");
                UpdateOutcome::installed(&path)
            }
            Err(err @ (UpdateError::Download(_) | UpdateError::Integrity { .. })) => {
                error!("update failed: {err}");
                UpdateOutcome::failed(err.to_string())
            }
            Err(err) => {
                error!("update failed unexpectedly: {err}");
                UpdateOutcome::failed(format!("Unexpected error: {err}"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::Producer;
    use crate::helpers::integrity::sha256_hex;
    use crate::updater::tests::{CHECKSUM_URL, DATASET_URL, StubSource};
    use serde_json::{Value, json};
    use std::cell::Cell;
    use std::fs;
    use tempfile::TempDir;

    fn dataset() -> Value {
        json!([
            {"id": "ebe22a8d", "name": "Add Spring JDBC", "category": "spring",
             "sub-category": "jdbc", "tags": ["spring", "jdbc"],
             "dependency": "org.openrewrite.recipe:rewrite-spring"},
            {"id": "c0ffee", "name": "Migrate to JUnit 5", "category": "testing",
             "sub-category": "junit", "tags": ["testing"],
             "dependency": "org.openrewrite.recipe:rewrite-testing-frameworks"}
        ])
    }

    fn target(dest_dir: &Path) -> UpdateTarget {
        UpdateTarget {
            dataset_url: DATASET_URL.to_string(),
            checksum_url: CHECKSUM_URL.to_string(),
            dest_dir: dest_dir.to_path_buf(),
        }
    }

    fn service_with<F: Fn() -> Value>(
        source: F,
        remote: StubSource,
        dest_dir: &Path,
    ) -> RecipeService<Producer<F>, StubSource> {
        RecipeService::new(
            RecipeRepository::new(Producer(source)),
            RemoteUpdater::new(remote),
            target(dest_dir),
        )
    }

    #[test]
    fn arguments_are_trimmed() {
        let svc = service_with(dataset, StubSource::failing("unused"), Path::new("unused"));

        assert_eq!(svc.find_by_id(Some("  ebe22a8d \n")).name(), Some("Add Spring JDBC"));
        assert_eq!(svc.find_by_tag(Some(" SPRING ")).len(), 1);
        assert_eq!(svc.find_by_name(Some("\tjunit")).len(), 1);
        assert_eq!(svc.find_by_dependency(Some(" rewrite-spring ")).len(), 1);
        assert_eq!(svc.list_subcategories(Some(" Spring ")), vec!["jdbc"]);
        assert_eq!(svc.find_by_category(Some(" spring "), Some("  JDBC ")).len(), 1);
    }

    #[test]
    fn blank_subcategory_means_whole_category() {
        let svc = service_with(dataset, StubSource::failing("unused"), Path::new("unused"));
        assert_eq!(svc.find_by_category(Some("spring"), Some("   ")).len(), 1);
        assert_eq!(svc.find_by_category(Some("spring"), None).len(), 1);
    }

    #[test]
    fn missing_or_blank_arguments_skip_the_repository() {
        let reads = Cell::new(0);
        let svc = service_with(
            || {
                reads.set(reads.get() + 1);
                dataset()
            },
            StubSource::failing("unused"),
            Path::new("unused"),
        );

        for arg in [None, Some(""), Some("   "), Some("\n\t")] {
            assert!(svc.list_subcategories(arg).is_empty());
            assert!(svc.find_by_category(arg, Some("jdbc")).is_empty());
            assert!(svc.find_by_tag(arg).is_empty());
            assert!(svc.find_by_name(arg).is_empty());
            assert!(svc.find_by_dependency(arg).is_empty());
            assert!(svc.find_by_id(arg).is_empty());
        }
        assert_eq!(reads.get(), 0);

        assert_eq!(svc.list_categories(), vec!["spring", "testing"]);
        assert_eq!(svc.list_categories_with_subcategories().len(), 2);
        assert_eq!(reads.get(), 2);
    }

    #[tokio::test]
    async fn successful_update_reports_both_paths() {
        let dir = TempDir::new().unwrap();
        let bytes = serde_json::to_vec(&dataset()).unwrap();
        let remote = StubSource::serving(&format!("{}\n", sha256_hex(&bytes)), &bytes);
        let svc = service_with(dataset, remote, dir.path());

        let outcome = svc.update_database().await;

        let json_path = dir.path().join("recipes.json").display().to_string();
        assert_eq!(
            outcome,
            UpdateOutcome {
                success: true,
                json_path: Some(json_path.clone()),
                sha256_path: Some(format!("{json_path}.sha256")),
                error: None,
            }
        );
        assert_eq!(
            serde_json::to_value(&outcome).unwrap(),
            json!({
                "success": true,
                "json_path": json_path,
                "sha256_path": format!("{json_path}.sha256"),
            })
        );
    }

    #[tokio::test]
    async fn integrity_failure_keeps_the_message() {
        let dir = TempDir::new().unwrap();
        let svc = service_with(dataset, StubSource::serving("WRONGHASH\n", b"[]"), dir.path());

        let outcome = svc.update_database().await;

        assert!(!outcome.success);
        let message = outcome.error.unwrap();
        assert_eq!(
            message,
            format!("SHA-256 hash mismatch: expected wronghash, got {}", sha256_hex(b"[]"))
        );
    }

    #[tokio::test]
    async fn network_failure_keeps_the_message() {
        let dir = TempDir::new().unwrap();
        let svc = service_with(dataset, StubSource::failing("Connection timeout"), dir.path());

        let outcome = svc.update_database().await;

        assert!(!outcome.success);
        assert_eq!(
            outcome.error.as_deref(),
            Some(
                "Failed to download recipes database: \
                 https://example.com/recipes.json.sha256: Connection timeout"
            )
        );
        assert_eq!(
            serde_json::to_value(&outcome).unwrap(),
            json!({"success": false, "error": outcome.error.clone().unwrap()})
        );
    }

    #[tokio::test]
    async fn other_failures_are_prefixed() {
        let dir = TempDir::new().unwrap();
        // A regular file where the destination directory should be.
        let blocker = dir.path().join("db");
        fs::write(&blocker, "not a directory").unwrap();
        let svc = service_with(dataset, StubSource::serving(&sha256_hex(b"[]"), b"[]"), &blocker);

        let outcome = svc.update_database().await;

        assert!(!outcome.success);
        assert!(outcome.error.unwrap().starts_with("Unexpected error: "));
        assert_eq!(fs::read_to_string(&blocker).unwrap(), "not a directory");
    }
}
