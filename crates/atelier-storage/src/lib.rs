//! Atelier storage crate - SQLite persistence and the repository facade.
//!
//! Provides a WAL-mode SQLite database with migrations, a generic storage
//! accessor over any [`Record`] type, the async [`Repository`] facade with
//! reactive snapshot streams, and the application-wide [`AppRepository`]
//! composing one repository per entity.

pub mod dao;
pub mod db;
pub mod facade;
pub mod migrations;
pub mod record;
pub mod repository;

pub use dao::SqliteDao;
pub use db::Database;
pub use facade::{AppRepository, RepositoryStats};
pub use record::Record;
pub use repository::{Repository, Watcher};
