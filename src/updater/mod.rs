mod source;

use std::fmt::Display;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::dataset::sidecar_path;
use crate::helpers::integrity::{
    checksum_line, digests_match, expected_digest, sha256_hex, write_atomic,
};

pub use source::{HttpSource, RemoteSource};

/// File name of the dataset inside the destination directory.
pub const DATASET_FILE_NAME: &str = "recipes.json";

/// ---- Errors ----
#[derive(thiserror::Error, Debug)]
pub enum UpdateError {
    /// Transport failure, timeout or non-success status.
    #[error("Failed to download recipes database: {0}")]
    Download(String),
    /// Downloaded bytes do not hash to the published digest.
    #[error("SHA-256 hash mismatch: expected {expected}, got {actual}")]
    Integrity { expected: String, actual: String },
    #[error("HTTP client setup failed: {0}")]
    Client(reqwest::Error),
    #[error("{0}")]
    Io(#[from] io::Error),
}

impl UpdateError {
    pub(crate) fn download(url: &str, err: impl Display) -> Self {
        UpdateError::Download(format!("{url}: {err}"))
    }
}

/// Replaces the local dataset with a verified copy of the published one.
pub struct RemoteUpdater<R> {
    source: R,
}

impl<R: RemoteSource> RemoteUpdater<R> {
    pub fn new(source: R) -> Self {
        Self { source }
    }

    /// Download, verify and install the dataset into `dest_dir`.
    ///
    /// The checksum is fetched first, then the dataset. Nothing under
    /// `dest_dir` is touched unless the dataset hashes to the published digest.
    /// On success both `recipes.json` and `recipes.json.sha256` have been
    /// replaced atomically and the dataset path is returned.
    pub async fn update(
        &self,
        dataset_url: &str,
        checksum_url: &str,
        dest_dir: &Path,
    ) -> Result<PathBuf, UpdateError> {
        let checksum_body = self.source.fetch_text(checksum_url).await?;
        let expected = expected_digest(&checksum_body);

        let bytes = self.source.fetch_bytes(dataset_url).await?;
        let actual = sha256_hex(&bytes);

        if !digests_match(&expected, &actual) {
            warn!(%expected, %actual, "refusing dataset with mismatching digest");
            return Err(UpdateError::Integrity { expected, actual });
        }

        let dataset_path = dest_dir.join(DATASET_FILE_NAME);
        write_atomic(&dataset_path, &bytes)?;
        write_atomic(&sidecar_path(&dataset_path), checksum_line(&checksum_body).as_bytes())?;

        info!(path = %dataset_path.display(), bytes = bytes.len(), "recipes database updated");
        Ok(dataset_path)
    }
}
