pub mod catalogue;
pub mod report;

pub use catalogue::{run_catalogue, QueryParams, QueryResult};
pub use report::write_results;
