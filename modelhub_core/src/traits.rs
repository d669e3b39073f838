use crate::Result;
use crate::models::Binding;
use async_trait::async_trait;

/// Reads a single file from the repository a binding points at.
///
/// Implementations never touch the catalog cache. The GitHub contents API
/// implementation lives in `crate::github`.
#[async_trait]
pub trait ContentFetcher: Send + Sync {
    /// Fetch and decode the file at `path` on `binding.branch`.
    ///
    /// An empty `credential` means an anonymous read.
    async fn fetch_raw(&self, credential: &str, binding: &Binding, path: &str) -> Result<Vec<u8>>;
}
