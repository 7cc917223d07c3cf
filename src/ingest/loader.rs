use indicatif::ProgressBar;
use rusqlite::Connection;
use tracing::info;

use crate::error::Result;
use crate::ingest::ingestor::DocumentIngestor;
use crate::ingest::scanner::SourceDocument;

/// Ingest documents in encounter order and return how many were processed.
///
/// The first failing document, or the first error yielded by `documents`,
/// stops the batch and is returned as is.
pub fn load_all<I>(conn: &Connection, documents: I, progress: &ProgressBar) -> Result<usize>
where
    I: IntoIterator<Item = Result<SourceDocument>>,
{
    let ingestor = DocumentIngestor::new(conn);
    let mut count = 0;

    for source in documents {
        let source = source?;
        info!("Loading {:?} into sqlite", source.path);
        let image = ingestor.ingest(&source.document)?;
        info!("Inserted image {} ({})", image, source.document.url);

        count += 1;
        progress.inc(1);
    }

    progress.finish_and_clear();
    info!("Loaded {} JSON documents into sqlite", count);
    Ok(count)
}
