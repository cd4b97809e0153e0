use std::fmt;
use std::fs::{self, File};
use std::io::{self, BufReader, Seek};
use std::ops::ControlFlow;
use std::path::{Path, PathBuf};

use serde::Deserializer as _;
use serde::de::{IgnoredAny, SeqAccess, Visitor};
use serde_json::Value;
use tracing::{debug, warn};

use super::{DatasetSource, Record, visit_document};

/// Dataset file parsed in one go on every pass.
#[derive(Debug, Clone)]
pub struct JsonFile {
    path: PathBuf,
}

impl JsonFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> io::Result<Value> {
        let bytes = fs::read(&self.path)?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

impl DatasetSource for JsonFile {
    fn scan(&self, visit: &mut dyn FnMut(Record) -> ControlFlow<()>) {
        match self.load() {
            Ok(document) => visit_document(document, visit),
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "dataset file not found");
            }
            Err(err) => {
                warn!(path = %self.path.display(), "ignoring unreadable dataset: {err}");
            }
        }
    }
}

/// Dataset file read incrementally, holding one record in memory at a time.
///
/// A pass reads the file twice through one open handle. The first read only
/// checks that the whole document is a well-formed JSON array; records are
/// handed out during the second read. A broken document therefore yields no
/// records at all instead of the records that happened to precede the damage.
///
/// Both reads see the same file even if the path is replaced by a rename in
/// between, which is how the updater and the dataset writer replace it.
/// Rewriting the file in place during a pass is not detected.
#[derive(Debug, Clone)]
pub struct StreamingJsonFile {
    path: PathBuf,
}

impl StreamingJsonFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl DatasetSource for StreamingJsonFile {
    fn scan(&self, visit: &mut dyn FnMut(Record) -> ControlFlow<()>) {
        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "dataset file not found");
                return;
            }
            Err(err) => {
                warn!(path = %self.path.display(), "ignoring unreadable dataset: {err}");
                return;
            }
        };

        if let Err(err) = stream_records(file, visit) {
            warn!(path = %self.path.display(), "ignoring unreadable dataset: {err}");
        }
    }
}

/// Validate the whole document, rewind, then hand out its records.
fn stream_records(
    mut file: File,
    visit: &mut dyn FnMut(Record) -> ControlFlow<()>,
) -> io::Result<()> {
    walk(&mut file, ArrayProbe)?;
    file.rewind()?;
    walk(&mut file, RecordWalker { visit })
}

fn walk<V>(file: &mut File, visitor: V) -> io::Result<()>
where
    V: for<'de> Visitor<'de, Value = ()>,
{
    let mut de = serde_json::Deserializer::from_reader(BufReader::new(file));
    (&mut de).deserialize_seq(visitor)?;
    de.end()?;
    Ok(())
}

/// Accepts any array, skipping over its contents.
struct ArrayProbe;

impl<'de> Visitor<'de> for ArrayProbe {
    type Value = ();

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a JSON array of recipes")
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<(), A::Error> {
        while seq.next_element::<IgnoredAny>()?.is_some() {}
        Ok(())
    }
}

/// Feeds each object element of the array to the caller.
struct RecordWalker<'v> {
    visit: &'v mut dyn FnMut(Record) -> ControlFlow<()>,
}

impl<'de> Visitor<'de> for RecordWalker<'_> {
    type Value = ();

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a JSON array of recipes")
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<(), A::Error> {
        let visit = self.visit;
        while let Some(value) = seq.next_element::<Value>()? {
            let Some(record) = Record::from_value(value) else {
                continue;
            };
            if visit(record).is_break() {
                // Drain so the deserializer sees a complete array.
                while seq.next_element::<IgnoredAny>()?.is_some() {}
                break;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::helpers::integrity::write_atomic;
    use std::io::Write;
    use tempfile::TempDir;

    const SAMPLE: &str = r#"[
        {"id": "1", "name": "Add Spring JDBC", "category": "spring"},
        null,
        "stray",
        {"id": "2", "name": "Add Spring Web", "category": "spring"},
        {"id": "3", "name": "Migrate to JUnit 5", "category": "testing"}
    ]"#;

    fn write(dir: &TempDir, name: &str, contents: &str) -> PathBuf {
        let path = dir.path().join(name);
        let mut file = File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        path
    }

    fn ids(records: &[Record]) -> Vec<&str> {
        records.iter().filter_map(Record::id).collect()
    }

    #[test]
    fn both_backends_agree_on_well_formed_files() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "recipes.json", SAMPLE);

        let full = JsonFile::new(&path).records();
        let streamed = StreamingJsonFile::new(&path).records();

        assert_eq!(ids(&full), vec!["1", "2", "3"]);
        assert_eq!(full, streamed);
    }

    #[test]
    fn malformed_files_yield_nothing() {
        let dir = TempDir::new().unwrap();
        let cases = [
            ("null.json", "null"),
            ("string.json", "\"not a list\""),
            ("object.json", r#"{"name": "x"}"#),
            ("broken.json", r#"[{"id": "1"}, {"id": "2""#),
            ("trailing.json", r#"[{"id": "1"}] garbage"#),
            ("empty.json", ""),
        ];

        for (name, contents) in cases {
            let path = write(&dir, name, contents);
            assert!(JsonFile::new(&path).records().is_empty(), "full: {name}");
            assert!(
                StreamingJsonFile::new(&path).records().is_empty(),
                "streaming: {name}"
            );
        }
    }

    #[test]
    fn missing_file_yields_nothing() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("absent.json");
        assert!(JsonFile::new(&path).records().is_empty());
        assert!(StreamingJsonFile::new(&path).records().is_empty());
    }

    #[test]
    fn streaming_early_exit_leaves_the_pass_consistent() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "recipes.json", SAMPLE);
        let source = StreamingJsonFile::new(&path);

        let mut first = None;
        source.scan(&mut |record| {
            first = record.id().map(str::to_string);
            ControlFlow::Break(())
        });
        assert_eq!(first.as_deref(), Some("1"));

        // A later pass starts from the top again.
        assert_eq!(source.records().len(), 3);
    }

    #[test]
    fn streaming_pass_keeps_reading_the_file_it_opened() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "recipes.json", SAMPLE);
        let opened = File::open(&path).unwrap();

        // Swapped for a broken document after the pass opened the file.
        write_atomic(&path, br#"[{"id": "1"}, {"id""#).unwrap();

        let mut seen = Vec::new();
        stream_records(opened, &mut |record| {
            seen.push(record);
            ControlFlow::Continue(())
        })
        .unwrap();
        assert_eq!(ids(&seen), vec!["1", "2", "3"]);

        // The next pass sees the broken replacement and yields nothing.
        assert!(StreamingJsonFile::new(&path).records().is_empty());
    }

    #[test]
    fn every_pass_rereads_the_file() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "recipes.json", r#"[{"id": "old"}]"#);
        let source = JsonFile::new(&path);
        assert_eq!(ids(&source.records()), vec!["old"]);

        write(&dir, "recipes.json", r#"[{"id": "new"}, {"id": "newer"}]"#);
        assert_eq!(ids(&source.records()), vec!["new", "newer"]);
    }
}
