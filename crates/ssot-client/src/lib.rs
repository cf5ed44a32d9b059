//! # Inventory REST Client
//!
//! Thin, typed HTTP client for the NetBox REST API: paginated listing,
//! create, patch, single and bulk delete, plus a status probe.
//!
//! Every request carries `Authorization: Token <token>`, honours a
//! per-request timeout, and optionally goes through a [`RetryPolicy`].
//! Non-2xx responses surface as [`ClientError`] with the status code and
//! response body.

pub mod auth;
pub mod client;
pub mod error;
pub mod retry;

pub use auth::ApiToken;
pub use client::{base_url, ClientConfig, NetboxClient, NetboxStatus, DEFAULT_TIMEOUT, PAGE_LIMIT};
pub use error::{ClientError, ClientResult};
pub use retry::RetryPolicy;
