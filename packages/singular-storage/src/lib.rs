pub mod db;
pub mod list;
pub mod models;
pub mod notes;
pub mod projects;
pub mod schema;
pub mod tags;
pub mod users;

mod error;

pub use error::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;
