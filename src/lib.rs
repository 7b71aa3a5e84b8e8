// src/lib.rs

//! Sermon scraper library.
//!
//! Crawls a paginated sermon archive and saves each sermon once, as a row in
//! a SQLite index and as a text file under `sermons/{author}/{title}.txt`.

pub mod error;
pub mod models;
pub mod pipeline;
pub mod services;
pub mod storage;
pub mod utils;
