// src/services/mod.rs

pub mod explanation;
pub mod github;
pub mod pdf;
