pub mod document;
pub mod ingestor;
pub mod loader;
pub mod scanner;

pub use document::AnnotationDocument;
pub use ingestor::DocumentIngestor;
pub use loader::load_all;
pub use scanner::{DocumentStream, SourceDocument};
