pub mod category;
pub mod container;
pub mod crud;
pub mod error;
pub mod gear;
pub mod health;
pub mod login;
pub mod manufacture;
pub mod routes;
pub mod top_category;
pub mod usergear;
pub mod users;
pub mod utils;

pub use error::ApiError;
pub use routes::{Router, build_api_router};
