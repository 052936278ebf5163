//! Telegram front end: collects user input, calls the rate backend, renders results

pub mod backend;
pub mod bot;
pub mod fallback;
pub mod format;
pub mod keyboards;
pub mod session;

pub use backend::{BackendClient, BackendError};
pub use fallback::Sourced;
pub use session::{Session, SessionStore};
