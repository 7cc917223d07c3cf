pub mod ids;
pub mod repo;
pub mod resolver;
pub mod schema;

pub use repo::Store;
pub use resolver::{MatchType, Resolver};
