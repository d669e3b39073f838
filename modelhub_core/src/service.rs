use crate::binding::BindingStore;
use crate::catalog::{CatalogCache, parse_catalog};
use crate::config::CatalogConfig;
use crate::github::GithubContentClient;
use crate::models::{Binding, ConnectRequest, Model};
use crate::traits::ContentFetcher;
use crate::Result;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

/// Whether a binding is active, and which.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ConnectionStatus {
    Disconnected,
    Connected(Binding),
}

/// Entry point for collaborators: binding lifecycle plus cached catalog reads.
///
/// All work runs on the caller's task. Concurrent misses are not coalesced;
/// two callers racing on an empty cache may both hit the network.
pub struct CatalogService {
    bindings: BindingStore,
    fetcher: Arc<dyn ContentFetcher>,
    cache: CatalogCache,
}

impl CatalogService {
    pub fn new(cfg: &CatalogConfig) -> Result<Self> {
        cfg.validate()?;
        let fetcher = Arc::new(GithubContentClient::new(&cfg.github)?);
        Ok(Self::with_fetcher(fetcher, cfg.cache_ttl))
    }

    pub fn with_fetcher(fetcher: Arc<dyn ContentFetcher>, cache_ttl: Duration) -> Self {
        Self {
            bindings: BindingStore::new(),
            fetcher,
            cache: CatalogCache::new(cache_ttl),
        }
    }

    pub fn bindings(&self) -> &BindingStore {
        &self.bindings
    }

    pub fn cache(&self) -> &CatalogCache {
        &self.cache
    }

    /// Return the catalog for the active binding, from cache unless
    /// `force_refresh` is set or the cached entry is stale.
    #[tracing::instrument(level = "info", skip(self, credential))]
    pub async fn fetch_models(&self, credential: &str, force_refresh: bool) -> Result<Vec<Model>> {
        // One read of the binding serves both the cache key and the fetch.
        let binding = self.bindings.require().await?;
        let signature = binding.signature();

        if !force_refresh {
            if let Some(models) = self.cache.lookup(&signature).await {
                tracing::debug!(count = models.len(), "catalog cache hit");
                return Ok(models);
            }
            tracing::debug!("catalog cache miss");
        }

        let content = self
            .fetcher
            .fetch_raw(credential, &binding, &binding.config_path)
            .await?;
        let models = parse_catalog(&content, &binding.config_path)?;
        self.cache.store(signature, &models).await;
        tracing::info!(count = models.len(), binding = %binding, "catalog fetched");
        Ok(models)
    }

    /// Fetch any file under the active binding (model cards, scripts, ...).
    /// Never cached.
    #[tracing::instrument(level = "info", skip(self, credential))]
    pub async fn fetch_raw(&self, credential: &str, path: &str) -> Result<Vec<u8>> {
        let binding = self.bindings.require().await?;
        self.fetcher.fetch_raw(credential, &binding, path).await
    }

    /// Invalidate, force a fetch, and return the model count.
    #[tracing::instrument(level = "info", skip(self, credential))]
    pub async fn test_connection(&self, credential: &str) -> Result<usize> {
        self.cache.invalidate().await;
        let models = self.fetch_models(credential, true).await?;
        Ok(models.len())
    }

    pub async fn invalidate_cache(&self) {
        self.cache.invalidate().await;
    }

    /// Replace the active binding and probe it once.
    ///
    /// On probe failure the binding is cleared and the error returned, unless a
    /// concurrent `connect` has already replaced it.
    #[tracing::instrument(level = "info", skip(self, credential))]
    pub async fn connect(&self, credential: &str, request: ConnectRequest) -> Result<usize> {
        let binding = request.into_binding()?;
        self.bindings.set(binding.clone()).await;

        match self.test_connection(credential).await {
            Ok(count) => {
                tracing::info!(binding = %binding, count, "connected");
                Ok(count)
            }
            Err(err) => {
                tracing::warn!(binding = %binding, error = %err, "connection probe failed");
                if self.bindings.clear_if(&binding).await {
                    self.cache.invalidate().await;
                }
                Err(err)
            }
        }
    }

    #[tracing::instrument(level = "info", skip(self))]
    pub async fn disconnect(&self) {
        self.bindings.clear().await;
        self.cache.invalidate().await;
    }

    pub async fn status(&self) -> ConnectionStatus {
        match self.bindings.get().await {
            Some(binding) => ConnectionStatus::Connected(binding),
            None => ConnectionStatus::Disconnected,
        }
    }

    /// Look a model up by id in the (possibly cached) catalog.
    #[tracing::instrument(level = "debug", skip(self, credential))]
    pub async fn get_model(&self, credential: &str, id: &str) -> Result<Option<Model>> {
        let models = self.fetch_models(credential, false).await?;
        Ok(models.into_iter().find(|m| m.id == id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{HttpError, HttpErrorKind};
    use crate::models::ModelStatus;
    use crate::Error;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::Notify;

    /// In-memory repository keyed by `(branch, path)`.
    #[derive(Default)]
    struct FakeRepo {
        files: Mutex<HashMap<(String, String), Vec<u8>>>,
        held: Mutex<HashMap<String, Arc<Notify>>>,
        calls: AtomicUsize,
    }

    impl FakeRepo {
        fn put(&self, branch: &str, path: &str, content: &str) {
            self.files
                .lock()
                .unwrap()
                .insert((branch.into(), path.into()), content.as_bytes().to_vec());
        }

        /// Reads on `branch` wait until the returned gate is notified.
        fn hold(&self, branch: &str) -> Arc<Notify> {
            let gate = Arc::new(Notify::new());
            self.held
                .lock()
                .unwrap()
                .insert(branch.into(), gate.clone());
            gate
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ContentFetcher for FakeRepo {
        async fn fetch_raw(
            &self,
            credential: &str,
            binding: &Binding,
            path: &str,
        ) -> Result<Vec<u8>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let gate = self.held.lock().unwrap().get(&binding.branch).cloned();
            if let Some(gate) = gate {
                gate.notified().await;
            }
            self.files
                .lock()
                .unwrap()
                .get(&(binding.branch.clone(), path.to_string()))
                .cloned()
                .ok_or_else(|| {
                    HttpError::new(404, "Not Found", !credential.is_empty(), path).into()
                })
        }
    }

    fn service(repo: Arc<FakeRepo>, ttl: Duration) -> CatalogService {
        CatalogService::with_fetcher(repo, ttl)
    }

    fn request(branch: &str) -> ConnectRequest {
        ConnectRequest {
            owner: "acme".into(),
            repo: "ml".into(),
            branch: Some(branch.into()),
            config_path: None,
        }
    }

    #[tokio::test]
    async fn not_configured() {
        let svc = service(Arc::new(FakeRepo::default()), Duration::from_secs(300));
        assert!(matches!(
            svc.fetch_models("tok", false).await,
            Err(Error::NotConfigured)
        ));
        assert!(matches!(
            svc.fetch_raw("tok", "x.py").await,
            Err(Error::NotConfigured)
        ));
        assert_eq!(svc.status().await, ConnectionStatus::Disconnected);
    }

    #[tokio::test]
    async fn second_read_is_served_from_cache() {
        let repo = Arc::new(FakeRepo::default());
        repo.put("main", "models.yaml", "- name: Alpha\n  status: production\n");
        let svc = service(repo.clone(), Duration::from_secs(300));
        svc.bindings()
            .set(Binding::new("acme", "ml", "main", "models.yaml"))
            .await;

        let first = svc.fetch_models("tok", false).await.unwrap();
        assert_eq!(repo.calls(), 1);
        assert_eq!(first[0].id, "model-0");
        assert_eq!(first[0].status, ModelStatus::Production);

        let second = svc.fetch_models("tok", false).await.unwrap();
        assert_eq!(repo.calls(), 1);
        assert_eq!(first, second);

        svc.fetch_models("tok", true).await.unwrap();
        assert_eq!(repo.calls(), 2);
    }

    #[tokio::test]
    async fn binding_change_misses_cache() {
        let repo = Arc::new(FakeRepo::default());
        repo.put("main", "models.yaml", "- name: Main\n");
        repo.put("dev", "models.yaml", "- name: Dev\n");
        let svc = service(repo.clone(), Duration::from_secs(300));

        svc.bindings()
            .set(Binding::new("acme", "ml", "main", "models.yaml"))
            .await;
        assert_eq!(svc.fetch_models("", false).await.unwrap()[0].name, "Main");

        svc.bindings()
            .set(Binding::new("acme", "ml", "dev", "models.yaml"))
            .await;
        assert_eq!(svc.fetch_models("", false).await.unwrap()[0].name, "Dev");
        assert_eq!(repo.calls(), 2);
    }

    #[tokio::test]
    async fn expired_entry_refetches() {
        let repo = Arc::new(FakeRepo::default());
        repo.put("main", "models.yaml", "- name: Alpha\n");
        let svc = service(repo.clone(), Duration::from_millis(20));
        svc.bindings()
            .set(Binding::new("acme", "ml", "main", "models.yaml"))
            .await;

        svc.fetch_models("", false).await.unwrap();
        tokio::time::sleep(Duration::from_millis(40)).await;
        svc.fetch_models("", false).await.unwrap();
        assert_eq!(repo.calls(), 2);
    }

    #[tokio::test]
    async fn failed_fetch_keeps_cached_entry() {
        let repo = Arc::new(FakeRepo::default());
        repo.put("main", "models.yaml", "- name: Alpha\n");
        let svc = service(repo.clone(), Duration::from_secs(300));
        svc.bindings()
            .set(Binding::new("acme", "ml", "main", "models.yaml"))
            .await;
        svc.fetch_models("", false).await.unwrap();

        repo.put("main", "models.yaml", "- name: [broken");
        let err = svc.fetch_models("", true).await.unwrap_err();
        assert!(matches!(err, Error::Parse { .. }), "{err}");

        let cached = svc.fetch_models("", false).await.unwrap();
        assert_eq!(cached[0].name, "Alpha");
        assert_eq!(repo.calls(), 2);
    }

    #[tokio::test]
    async fn connect_probes_once_and_reports_count() {
        let repo = Arc::new(FakeRepo::default());
        repo.put("main", "models.yaml", "- name: A\n- name: B\n");
        let svc = service(repo.clone(), Duration::from_secs(300));

        let count = svc.connect("tok", request("main")).await.unwrap();
        assert_eq!(count, 2);
        assert_eq!(repo.calls(), 1);
        assert_eq!(
            svc.status().await,
            ConnectionStatus::Connected(Binding::new("acme", "ml", "main", "models.yaml"))
        );

        // The probe primed the cache.
        svc.fetch_models("tok", false).await.unwrap();
        assert_eq!(repo.calls(), 1);
    }

    #[tokio::test]
    async fn failed_connect_clears_binding() {
        let repo = Arc::new(FakeRepo::default());
        repo.put("main", "models.yaml", "- name: A\n");
        let svc = service(repo.clone(), Duration::from_secs(300));
        svc.connect("", request("main")).await.unwrap();

        let err = svc.connect("", request("missing")).await.unwrap_err();
        assert_eq!(err.http_kind(), Some(HttpErrorKind::NotFound));
        assert!(err.to_string().contains("sign in"), "{err}");
        assert_eq!(svc.status().await, ConnectionStatus::Disconnected);
        assert!(matches!(
            svc.fetch_models("", false).await,
            Err(Error::NotConfigured)
        ));
    }

    #[tokio::test]
    async fn failed_connect_keeps_a_newer_binding() {
        let repo = Arc::new(FakeRepo::default());
        repo.put("main", "models.yaml", "- name: A\n");
        let gate = repo.hold("missing");
        let svc = Arc::new(service(repo.clone(), Duration::from_secs(300)));

        let slow = tokio::spawn({
            let svc = svc.clone();
            async move { svc.connect("", request("missing")).await }
        });
        while repo.calls() == 0 {
            tokio::task::yield_now().await;
        }

        assert_eq!(svc.connect("", request("main")).await.unwrap(), 1);
        gate.notify_one();
        let err = slow.await.unwrap().unwrap_err();
        assert_eq!(err.http_kind(), Some(HttpErrorKind::NotFound));

        assert_eq!(
            svc.status().await,
            ConnectionStatus::Connected(Binding::new("acme", "ml", "main", "models.yaml"))
        );
        svc.fetch_models("", false).await.unwrap();
        assert_eq!(repo.calls(), 2);
    }

    #[tokio::test]
    async fn connect_rejects_missing_owner_without_probe() {
        let repo = Arc::new(FakeRepo::default());
        let svc = service(repo.clone(), Duration::from_secs(300));
        let err = svc
            .connect(
                "",
                ConnectRequest {
                    repo: "ml".into(),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
        assert_eq!(repo.calls(), 0);
    }

    #[tokio::test]
    async fn disconnect_drops_binding_and_cache() {
        let repo = Arc::new(FakeRepo::default());
        repo.put("main", "models.yaml", "- name: A\n");
        let svc = service(repo.clone(), Duration::from_secs(300));
        svc.connect("", request("main")).await.unwrap();

        svc.disconnect().await;
        assert_eq!(svc.status().await, ConnectionStatus::Disconnected);

        let sig = Binding::new("acme", "ml", "main", "models.yaml").signature();
        assert!(svc.cache().lookup(&sig).await.is_none());
    }

    #[tokio::test]
    async fn invalidate_cache_forces_next_read_remote() {
        let repo = Arc::new(FakeRepo::default());
        repo.put("main", "models.yaml", "- name: A\n");
        let svc = service(repo.clone(), Duration::from_secs(300));
        svc.connect("", request("main")).await.unwrap();

        svc.invalidate_cache().await;
        svc.fetch_models("", false).await.unwrap();
        assert_eq!(repo.calls(), 2);
        svc.fetch_models("", false).await.unwrap();
        assert_eq!(repo.calls(), 2);
    }

    #[tokio::test]
    async fn test_connection_bypasses_cache() {
        let repo = Arc::new(FakeRepo::default());
        repo.put("main", "models.yaml", "- name: A\n");
        let svc = service(repo.clone(), Duration::from_secs(300));
        svc.connect("", request("main")).await.unwrap();

        repo.put("main", "models.yaml", "- name: A\n- name: B\n- name: C\n");
        assert_eq!(svc.test_connection("").await.unwrap(), 3);
        assert_eq!(repo.calls(), 2);
    }

    #[tokio::test]
    async fn raw_reads_and_model_lookup() {
        let repo = Arc::new(FakeRepo::default());
        repo.put(
            "main",
            "models.yaml",
            "- id: churn\n  name: Churn\n  files:\n    trainingScript: train.py\n",
        );
        repo.put("main", "train.py", "print('hi')\n");
        let svc = service(repo.clone(), Duration::from_secs(300));
        svc.connect("", request("main")).await.unwrap();

        let model = svc.get_model("", "churn").await.unwrap().unwrap();
        let script = model.files.unwrap().training_script.unwrap();
        assert_eq!(svc.fetch_raw("", &script).await.unwrap(), b"print('hi')\n");
        assert!(svc.get_model("", "nope").await.unwrap().is_none());
    }

    #[test]
    fn status_serializes_flat() {
        let v = serde_json::to_value(ConnectionStatus::Connected(Binding::new(
            "acme",
            "ml",
            "main",
            "models.yaml",
        )))
        .unwrap();
        assert_eq!(v["status"], "connected");
        assert_eq!(v["configPath"], "models.yaml");

        let v = serde_json::to_value(ConnectionStatus::Disconnected).unwrap();
        assert_eq!(v, serde_json::json!({"status": "disconnected"}));
    }
}
