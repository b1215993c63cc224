// src/lib.rs

pub mod config;
pub mod error;
pub mod extract;
pub mod gemini;
pub mod history;
pub mod pipeline;
pub mod session;
pub mod storage;
pub mod tmdb;
