//! HTTP request handlers.

pub mod health;
pub mod uploads;

pub use health::{health, ready};
pub use uploads::{complete_upload, list_orphans, upload_chunk};
