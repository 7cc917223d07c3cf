//! # annotation-graph
//!
//! Loads a directory of image-annotation documents (labels, matching images,
//! hosting pages, web entities, landmarks with locations) into a normalized
//! SQLite schema without duplicating entities or edges, then runs a fixed
//! catalogue of analytic queries over it.
//!
//! ```rust,no_run
//! use annotation_graph::{DocumentStream, QueryParams, Store};
//! use indicatif::ProgressBar;
//! use std::path::Path;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut store = Store::open("data/sqlite.db")?;
//!     store.create_schema(true)?;
//!     let loaded = store.load(DocumentStream::open(Path::new("data/json")), &ProgressBar::hidden())?;
//!     println!("Loaded {} documents", loaded);
//!
//!     let results = annotation_graph::run_catalogue(store.conn(), &QueryParams::default())?;
//!     annotation_graph::query::write_results(&mut std::io::stdout(), &results)?;
//!     Ok(())
//! }
//! ```

pub mod database;
pub mod error;
pub mod ingest;
pub mod query;
pub mod utils;

pub use database::{MatchType, Resolver, Store};
pub use error::{Error, Result};
pub use ingest::{AnnotationDocument, DocumentIngestor, DocumentStream, SourceDocument};
pub use query::{run_catalogue, QueryParams, QueryResult};
