pub mod create;
pub mod descriptor;
pub mod error;
pub mod filter;
pub mod mapper;
pub mod models;
pub mod pool;
pub mod usergear;
pub mod users;
pub mod utils;

#[cfg(test)]
pub(crate) mod test_support;

pub use create::create_tables;
pub use error::{DbError, DbResult};
pub use filter::{Filter, list_page};
pub use pool::{Database, DbConfig};
