//! Shared bootstrap for Spektif HTTP functions.
//!
//! Resolves the execution mode once from the environment and builds the
//! admin app, Firestore and Storage handles, global options and CORS policy
//! that every function handler receives.

pub mod app;
pub mod bootstrap;
pub mod config;
pub mod credentials;
pub mod db;
pub mod error;
pub mod functions;
pub mod http;
pub mod logging;
pub mod options;
pub mod storage;

#[cfg(test)]
mod test_support;

pub use app::AdminApp;
pub use bootstrap::Backend;
pub use config::{Environment, EnvironmentMode};
pub use credentials::Credential;
pub use db::{DatabaseId, Firestore};
pub use error::{Error, Result};
pub use functions::{FunctionManifest, Functions};
pub use http::{cors_layer, error_response, json_response, ApiResponse};
pub use logging::init_tracing;
pub use options::GlobalOptions;
pub use storage::Storage;
