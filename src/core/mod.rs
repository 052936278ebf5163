//! Core types shared by the rate backend and the chat front end

pub mod cache;
pub mod config;
pub mod currency;
pub mod error;
pub mod log;

// Re-export main types for cleaner imports
pub use cache::{CacheEntry, RateCache};
pub use currency::{Currency, RateHistory, RateProvider, RateTable};
pub use error::RateError;
