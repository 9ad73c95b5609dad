use pptx_slides::{prepare_workspace, WorkspaceReport};
use std::fs;
use std::io::{self, Write};
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing_subscriber::fmt::MakeWriter;

/// Collects formatted log output in memory.
#[derive(Clone, Default)]
struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl CapturedLogs {
    fn lines(&self) -> Vec<String> {
        let buffer = self.0.lock().unwrap();
        String::from_utf8_lossy(&buffer).lines().map(str::to_string).collect()
    }
}

impl Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for CapturedLogs {
    type Writer = CapturedLogs;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

fn prepare_with_logs(dir: &Path) -> (WorkspaceReport, Vec<String>) {
    let logs = CapturedLogs::default();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(logs.clone())
        .with_max_level(tracing::Level::INFO)
        .with_ansi(false)
        .without_time()
        .finish();
    let report = tracing::subscriber::with_default(subscriber, || prepare_workspace(dir)).unwrap();
    (report, logs.lines())
}

fn file_count(dir: &Path) -> usize {
    fs::read_dir(dir)
        .unwrap()
        .filter(|entry| entry.as_ref().unwrap().file_type().unwrap().is_file())
        .count()
}

#[test]
fn test_missing_directory_is_created_empty() {
    let tmp = tempfile::tempdir().unwrap();
    let out = tmp.path().join("out");

    let report = prepare_workspace(&out).unwrap();
    assert!(report.created);
    assert!(out.is_dir());
    assert_eq!(file_count(&out), 0);
}

#[test]
fn test_existing_files_are_deleted_and_reported() {
    let tmp = tempfile::tempdir().unwrap();
    let out = tmp.path().join("out");
    fs::create_dir(&out).unwrap();
    fs::write(out.join("a.txt"), "a").unwrap();
    fs::write(out.join("b.txt"), "b").unwrap();

    let report = prepare_workspace(&out).unwrap();
    assert!(!report.created);
    assert_eq!(report.deleted.len(), 2);
    assert!(out.is_dir());
    assert_eq!(file_count(&out), 0);
}

#[test]
fn test_preparation_is_idempotent() {
    let tmp = tempfile::tempdir().unwrap();
    let out = tmp.path().join("nested").join("out");

    let first = prepare_workspace(&out).unwrap();
    let second = prepare_workspace(&out).unwrap();
    assert!(first.created);
    assert_eq!(second, WorkspaceReport::default());
    assert!(out.is_dir());
    assert_eq!(file_count(&out), 0);
}

#[test]
fn test_failure_is_raw_io_error() {
    let tmp = tempfile::tempdir().unwrap();
    let blocker = tmp.path().join("blocker");
    fs::write(&blocker, "file in the way").unwrap();

    let err = prepare_workspace(&blocker.join("out")).unwrap_err();
    assert_ne!(err.kind(), std::io::ErrorKind::NotFound);
}

#[test]
fn test_creation_notice() {
    let tmp = tempfile::tempdir().unwrap();
    let out = tmp.path().join("out");

    let (report, lines) = prepare_with_logs(&out);
    assert!(report.created);
    let expected = format!("Directory '{}' created successfully.", out.display());
    assert_eq!(lines.iter().filter(|line| line.ends_with(&expected)).count(), 1);
    assert_eq!(lines.len(), 1);
}

#[test]
fn test_cleanup_notices_list_every_deleted_file() {
    let tmp = tempfile::tempdir().unwrap();
    let out = tmp.path().join("out");
    fs::create_dir(&out).unwrap();
    for name in ["a.txt", "b.txt", "c.pptx"] {
        fs::write(out.join(name), name).unwrap();
    }
    fs::create_dir(out.join("kept")).unwrap();

    let (report, lines) = prepare_with_logs(&out);
    assert_eq!(report.deleted.len(), 3);

    let deletions: Vec<&String> = lines.iter().filter(|line| line.contains("File deleted: ")).collect();
    assert_eq!(deletions.len(), 3);
    for (line, name) in deletions.iter().zip(["a.txt", "b.txt", "c.pptx"]) {
        assert!(line.ends_with(&format!("File deleted: {}", out.join(name).display())));
    }

    let cleaned = format!("Directory '{}' cleaned up.", out.display());
    assert!(lines.last().unwrap().ends_with(&cleaned));
}
