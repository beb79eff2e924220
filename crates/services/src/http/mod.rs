//! JSON-over-HTTP client for the vocabulary API.

mod client;
mod envelope;

pub use client::{HttpClient, RequestOptions, TokenExpiredHook};
pub use envelope::{Paginated, Pagination};
