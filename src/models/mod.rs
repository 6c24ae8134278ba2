// src/models/mod.rs

pub mod app_flag;
pub mod attempt;
pub mod editor_content;
pub mod further_explanation;
pub mod question;
pub mod quiz_set;
pub mod user;
