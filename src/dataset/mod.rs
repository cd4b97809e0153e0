mod json_file;
mod record;
mod store;

use std::ops::ControlFlow;
use std::path::{Path, PathBuf};

use serde_json::Value;

pub use json_file::{JsonFile, StreamingJsonFile};
pub use record::{Record, fields};
pub use store::{reformat, seal, sidecar_path, verify_local};

/// Something that can hand out the dataset, one record at a time, as often as
/// asked.
///
/// Every call to [`DatasetSource::scan`] is a fresh pass over the underlying
/// data: nothing is cached between passes, so a file replaced on disk is seen
/// by the next query. Sources never fail. Whatever goes wrong while reading
/// (missing file, bad JSON, a top-level value that is not an array) results in
/// a pass that visits nothing.
pub trait DatasetSource {
    /// Visit the records in dataset order until `visit` breaks or the data ends.
    fn scan(&self, visit: &mut dyn FnMut(Record) -> ControlFlow<()>);

    /// Collect a whole pass into memory.
    #[allow(unused)]
    fn records(&self) -> Vec<Record> {
        let mut out = Vec::new();
        self.scan(&mut |record| {
            out.push(record);
            ControlFlow::Continue(())
        });
        out
    }
}

impl<T: DatasetSource + ?Sized> DatasetSource for &T {
    fn scan(&self, visit: &mut dyn FnMut(Record) -> ControlFlow<()>) {
        (**self).scan(visit)
    }
}

/// Dataset produced by a callable, re-invoked on every pass.
///
/// Handy for tests and for embedding a dataset that does not live on disk.
#[allow(unused)]
pub struct Producer<F>(pub F);

impl<F> DatasetSource for Producer<F>
where
    F: Fn() -> Value,
{
    fn scan(&self, visit: &mut dyn FnMut(Record) -> ControlFlow<()>) {
        visit_document((self.0)(), visit);
    }
}

/// Apply the top-level policy to an already parsed document.
pub(crate) fn visit_document(document: Value, visit: &mut dyn FnMut(Record) -> ControlFlow<()>) {
    let Value::Array(items) = document else {
        tracing::debug!("dataset is not a JSON array, treating it as empty");
        return;
    };

    for record in items.into_iter().filter_map(Record::from_value) {
        if visit(record).is_break() {
            break;
        }
    }
}

/// File-backed source, picking the parse strategy at runtime.
#[derive(Debug, Clone)]
pub enum FileBackend {
    Full(JsonFile),
    Streaming(StreamingJsonFile),
}

impl FileBackend {
    pub fn open(path: impl Into<PathBuf>, streaming: bool) -> Self {
        let path = path.into();
        if streaming {
            FileBackend::Streaming(StreamingJsonFile::new(path))
        } else {
            FileBackend::Full(JsonFile::new(path))
        }
    }

    #[allow(unused)]
    pub fn path(&self) -> &Path {
        match self {
            FileBackend::Full(file) => file.path(),
            FileBackend::Streaming(file) => file.path(),
        }
    }
}

impl DatasetSource for FileBackend {
    fn scan(&self, visit: &mut dyn FnMut(Record) -> ControlFlow<()>) {
        match self {
            FileBackend::Full(file) => file.scan(visit),
            FileBackend::Streaming(file) => file.scan(visit),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::cell::Cell;

    #[test]
    fn producer_is_invoked_on_every_pass() {
        let calls = Cell::new(0);
        let source = Producer(|| {
            calls.set(calls.get() + 1);
            json!([{"name": "a"}, {"name": "b"}])
        });

        assert_eq!(source.records().len(), 2);
        assert_eq!(source.records().len(), 2);
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn non_object_elements_are_dropped() {
        let source = Producer(|| json!([null, "x", 1, {"name": "kept"}, [1, 2], true]));
        let records = source.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name(), Some("kept"));
    }

    #[test]
    fn non_array_documents_are_empty() {
        for document in [json!(null), json!("not a list"), json!({"name": "x"}), json!(3)] {
            let source = Producer(move || document.clone());
            assert!(source.records().is_empty());
        }
    }

    #[test]
    fn scan_stops_when_visitor_breaks() {
        let source = Producer(|| json!([{"id": "1"}, {"id": "2"}, {"id": "3"}]));
        let mut seen = Vec::new();
        source.scan(&mut |record| {
            seen.push(record.id().map(str::to_string));
            if seen.len() == 2 {
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(())
            }
        });
        assert_eq!(seen.len(), 2);
    }
}
