//! Authenticated session state and account endpoints.

mod service;
mod store;

pub use service::AuthService;
pub use store::AuthSessionStore;
