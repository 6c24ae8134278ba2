// src/handlers/mod.rs

pub mod auth;
pub mod editor;
pub mod explanation;
pub mod export;
pub mod question;
pub mod quiz_set;
pub mod score;
pub mod scraping;
