//! Data access for structure documents and the structure history.
//!
//! Functions that take part in a multi-step change are generic over
//! `ConnectionTrait` so callers can run them inside a transaction.

pub mod document_service;
pub mod history_service;

pub use document_service::*;
pub use history_service::*;
