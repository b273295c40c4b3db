// Library exports for SafeClass
// The CLI binary and the integration tests both build on these modules

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod models;
pub mod normalize;
pub mod upload;

pub use api::ApiClient;
pub use error::{ClientError, ClientResult};
