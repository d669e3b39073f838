//! modelhub core: resolves a repository-hosted model catalog into normalized
//! records, with a TTL cache keyed by the active repository binding.

#![forbid(unsafe_code)]

pub mod binding;
pub mod catalog;
pub mod config;
pub mod error;
pub mod github;
pub mod models;
pub mod o11y;
pub mod service;
pub mod traits;

pub use binding::BindingStore;
pub use catalog::{CatalogCache, parse_catalog};
pub use config::{CatalogConfig, GithubConfig, LogFormat};
pub use error::{Error, HttpError, HttpErrorKind, Result};
pub use github::GithubContentClient;
pub use models::{
    Binding, ConnectRequest, Dataset, Model, ModelFiles, ModelMetrics, ModelStatus, ModelVersion,
};
pub use service::{CatalogService, ConnectionStatus};
pub use traits::ContentFetcher;
