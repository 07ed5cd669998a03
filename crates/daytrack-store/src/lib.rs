//! Markdown-backed task store: the board model, the day/weekly document
//! format, and data directory I/O.

pub mod config;
pub mod error;
pub mod files;
pub mod markdown;
pub mod models;

pub use config::StoreConfig;
pub use error::StoreError;
pub use files::{DataDir, day_key, parse_day_key, week_key};
pub use models::{Board, Section, Task};
