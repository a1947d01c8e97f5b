pub mod attachments;
pub mod conversation;
pub mod db;
pub mod discovery;
pub mod error;
pub mod export;
pub mod models;
pub mod progress;
pub mod render;
pub mod timestamp;
