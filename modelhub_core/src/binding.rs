use crate::models::Binding;
use crate::{Error, Result};
use tokio::sync::RwLock;

/// Holds the single active repository binding.
///
/// Values go in and come out by copy; callers never share the stored value.
#[derive(Debug, Default)]
pub struct BindingStore {
    inner: RwLock<Option<Binding>>,
}

impl BindingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the active binding wholesale.
    #[tracing::instrument(level = "debug", skip(self))]
    pub async fn set(&self, binding: Binding) {
        *self.inner.write().await = Some(binding);
    }

    pub async fn get(&self) -> Option<Binding> {
        self.inner.read().await.clone()
    }

    /// Like `get`, but absence is `Error::NotConfigured`.
    pub async fn require(&self) -> Result<Binding> {
        self.get().await.ok_or(Error::NotConfigured)
    }

    #[tracing::instrument(level = "debug", skip(self))]
    pub async fn clear(&self) {
        *self.inner.write().await = None;
    }

    /// Clear only if the active binding is still `expected`. Returns whether
    /// it was cleared.
    #[tracing::instrument(level = "debug", skip(self))]
    pub async fn clear_if(&self, expected: &Binding) -> bool {
        let mut slot = self.inner.write().await;
        if slot.as_ref() == Some(expected) {
            *slot = None;
            true
        } else {
            false
        }
    }

    pub async fn is_configured(&self) -> bool {
        self.inner.read().await.is_some()
    }
}
