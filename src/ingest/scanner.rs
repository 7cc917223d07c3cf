use crossbeam::channel::{bounded, Receiver, Sender};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::thread::{self, JoinHandle};
use tracing::info;
use walkdir::{DirEntry, WalkDir};

use crate::error::{Error, Result};
use crate::ingest::document::AnnotationDocument;

const CHANNEL_CAPACITY: usize = 1024;

/// A parsed document together with the file it came from.
#[derive(Debug, Clone)]
pub struct SourceDocument {
    pub path: PathBuf,
    pub document: AnnotationDocument,
}

/// Send every visible `*.json` file directly inside `root` in file-name
/// order. Subdirectories are not entered; symlinked documents are read
/// through their target.
pub fn scan_directory(root: &Path, tx: Sender<PathBuf>) -> Result<()> {
    let walker = WalkDir::new(root)
        .max_depth(1)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter();

    for entry in walker.filter_entry(|e| e.depth() == 0 || !is_hidden(e)) {
        let entry = entry?;
        if entry.file_type().is_file() && is_json(entry.path()) {
            // Receiver gone means the batch stopped early.
            if tx.send(entry.path().to_path_buf()).is_err() {
                break;
            }
        }
    }
    Ok(())
}

pub fn read_document(path: &Path) -> Result<AnnotationDocument> {
    let file = File::open(path).map_err(|source| Error::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_reader(BufReader::new(file)).map_err(|source| Error::MalformedDocument {
        path: path.to_path_buf(),
        source,
    })
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry
        .file_name()
        .to_str()
        .map(|s| s.starts_with('.'))
        .unwrap_or(false)
}

fn is_json(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.eq_ignore_ascii_case("json"))
        .unwrap_or(false)
}

/// Lazy sequence of parsed documents under a directory.
///
/// A scanner thread walks the directory and feeds paths through a bounded
/// channel; each document is read and parsed only when the consumer asks for
/// it. A scan failure is reported as the final item.
pub struct DocumentStream {
    rx: Receiver<PathBuf>,
    scanner: Option<JoinHandle<Result<()>>>,
}

impl DocumentStream {
    pub fn open(root: &Path) -> Self {
        let (tx, rx) = bounded::<PathBuf>(CHANNEL_CAPACITY);
        let root = root.to_path_buf();
        let scanner = thread::spawn(move || {
            info!("Scanning {:?} for documents", root);
            scan_directory(&root, tx)
        });
        Self {
            rx,
            scanner: Some(scanner),
        }
    }
}

impl Iterator for DocumentStream {
    type Item = Result<SourceDocument>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.rx.recv() {
            Ok(path) => Some(read_document(&path).map(|document| SourceDocument { path, document })),
            Err(_) => {
                // Channel closed: the scanner is done, surface how it ended.
                let handle = self.scanner.take()?;
                match handle.join() {
                    Ok(Ok(())) => None,
                    Ok(Err(e)) => Some(Err(e)),
                    Err(_) => Some(Err(Error::ScannerPanicked)),
                }
            }
        }
    }
}
