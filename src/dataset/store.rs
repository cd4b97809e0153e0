use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};
use tracing::info;

use super::Record;
use crate::helpers::integrity::{
    checksum_line, digests_match, expected_digest, sha256_hex, write_atomic,
};

const HASH_CHUNK: usize = 4096;

/// `recipes.json` -> `recipes.json.sha256`
pub fn sidecar_path(path: &Path) -> PathBuf {
    let mut name: OsString = path.as_os_str().to_owned();
    name.push(".sha256");
    PathBuf::from(name)
}

/// Write `records` as a pretty printed JSON array and refresh the checksum
/// sidecar next to it. Both files are replaced atomically.
pub fn save_dataset(path: &Path, records: &[Record]) -> io::Result<PathBuf> {
    let bytes = serde_json::to_vec_pretty(records)?;
    write_atomic(path, &bytes)?;

    let sidecar = sidecar_path(path);
    write_atomic(&sidecar, checksum_line(&sha256_hex(&bytes)).as_bytes())?;

    info!(path = %path.display(), records = records.len(), "dataset saved");
    Ok(sidecar)
}

/// Rewrite an existing dataset pretty printed and refresh its sidecar.
///
/// Unlike the query path this is strict: unless the file is a JSON array of
/// objects it fails and leaves both files alone.
pub fn reformat(path: &Path) -> io::Result<PathBuf> {
    let records: Vec<Record> = serde_json::from_slice(&fs::read(path)?)?;
    save_dataset(path, &records)
}

/// Write the sidecar for an existing dataset file.
pub fn seal(path: &Path) -> io::Result<PathBuf> {
    let sidecar = sidecar_path(path);
    write_atomic(&sidecar, checksum_line(&file_sha256(path)?).as_bytes())?;
    Ok(sidecar)
}

/// SHA-256 of a file, read in small chunks.
pub fn file_sha256(path: &Path) -> io::Result<String> {
    let mut file = File::open(path)?;
    let mut hasher = Sha256::new();
    let mut buf = [0u8; HASH_CHUNK];
    loop {
        let n = file.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hex::encode(hasher.finalize()))
}

/// Digest recorded in the sidecar next to the digest of the dataset itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalDigest {
    pub expected: Option<String>,
    pub actual: String,
}

impl LocalDigest {
    pub fn matches(&self) -> bool {
        self.expected
            .as_deref()
            .is_some_and(|expected| digests_match(expected, &self.actual))
    }
}

/// Check a local dataset against its sidecar. A missing sidecar is reported
/// as `expected: None`; a missing dataset is an error.
pub fn verify_local(path: &Path) -> io::Result<LocalDigest> {
    let actual = file_sha256(path)?;
    let expected = match fs::read_to_string(sidecar_path(path)) {
        Ok(body) => Some(expected_digest(&body)),
        Err(err) if err.kind() == io::ErrorKind::NotFound => None,
        Err(err) => return Err(err),
    };
    Ok(LocalDigest { expected, actual })
}
