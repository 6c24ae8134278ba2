//! Quiz-authoring backend: question-bank scraping, quiz sets, attempts and
//! the HTTP API around them.

pub mod config;
pub mod docs;
pub mod error;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod scraping;
pub mod services;
pub mod state;
pub mod utils;

pub use routes::create_router;
