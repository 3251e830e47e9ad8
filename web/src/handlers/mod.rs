//! HTTP request handlers.

pub mod catalog;
pub mod health;

pub use health::health_check;
