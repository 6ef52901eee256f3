#![deny(unsafe_code)]

mod backend;
mod error;
mod http;
mod routes;

pub use backend::{BoxFuture, ChatBackend};
pub use error::{ACCESS_LOST_STATUS, BackendError, BackendResult};
pub use http::{BackendConfig, DEFAULT_BASE_URL, DEFAULT_REQUEST_TIMEOUT_MS, HttpBackend};
pub use routes::Routes;

#[cfg(any(test, feature = "testing"))]
pub mod testing;
