pub mod app;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod news;
pub mod repository;

pub use error::{AppError, Result};
pub use models::{Article, Resource};
pub use repository::NewsRepository;
