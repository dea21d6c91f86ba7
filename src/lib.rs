//! LibManager application library
//!
//! Hosts the book catalog module and the bootstrap that wires it into the
//! kernel registry and HTTP server.

pub mod app;
pub mod modules;

pub use modules::books::models::{BookId, BookPatch, BookRecord, NewBook};
pub use modules::books::store::{BookError, BookStore};
