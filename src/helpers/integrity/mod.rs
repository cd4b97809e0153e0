use std::fs;
use std::io::{self, Write};
use std::path::Path;

use sha2::{Digest, Sha256};
use tempfile::NamedTempFile;

/// Lowercase hex SHA-256 of `bytes`.
pub fn sha256_hex(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

/// Pull the digest out of a checksum document.
///
/// Only the first whitespace separated token counts, so both a bare digest and
/// the `<digest>  <filename>` layout of `sha256sum` are understood. An empty
/// document gives an empty digest, which never matches anything.
pub fn expected_digest(body: &str) -> String {
    body.split_whitespace()
        .next()
        .unwrap_or_default()
        .to_ascii_lowercase()
}

pub fn digests_match(expected: &str, actual: &str) -> bool {
    !expected.is_empty() && expected.eq_ignore_ascii_case(actual)
}

/// Checksum text as stored on disk: trailing whitespace dropped, one newline.
pub fn checksum_line(text: &str) -> String {
    format!("{}\n", text.trim_end())
}

/// Replace `dest` with `bytes` without readers ever seeing a partial file.
///
/// The data goes to a temporary file in the destination directory first and
/// is then renamed over `dest`, which is atomic within one filesystem.
pub fn write_atomic(dest: &Path, bytes: &[u8]) -> io::Result<()> {
    let parent = match dest.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent)?;

    let mut tmp = NamedTempFile::new_in(parent)?;
    tmp.write_all(bytes)?;
    tmp.flush()?;
    tmp.as_file().sync_all()?;
    tmp.persist(dest).map_err(|e| e.error)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn sha256_of_known_input() {
        assert_eq!(
            sha256_hex(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn expected_digest_takes_first_token() {
        assert_eq!(expected_digest("ABCDEF  recipes.json\n"), "abcdef");
        assert_eq!(expected_digest("  abc\n"), "abc");
        assert_eq!(expected_digest("\n"), "");
    }

    #[test]
    fn digest_comparison_ignores_case_but_not_emptiness() {
        assert!(digests_match("abcdef", "ABCDEF"));
        assert!(!digests_match("abcdef", "abcdee"));
        assert!(!digests_match("", ""));
    }

    #[test]
    fn checksum_line_ends_with_single_newline() {
        assert_eq!(checksum_line("abc"), "abc\n");
        assert_eq!(checksum_line("abc\n\n"), "abc\n");
        assert_eq!(checksum_line("abc  recipes.json\r\n"), "abc  recipes.json\n");
    }

    #[test]
    fn write_atomic_creates_and_replaces() {
        let dir = TempDir::new().unwrap();
        let dest = dir.path().join("nested").join("file.json");

        write_atomic(&dest, b"first").unwrap();
        assert_eq!(fs::read(&dest).unwrap(), b"first");

        write_atomic(&dest, b"second").unwrap();
        assert_eq!(fs::read(&dest).unwrap(), b"second");

        // Only the final file remains, no temporaries.
        let entries = fs::read_dir(dest.parent().unwrap()).unwrap().count();
        assert_eq!(entries, 1);
    }
}
