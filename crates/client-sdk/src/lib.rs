use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result};
use common::Product;
use registry_core::{FormInput, HydrationSource, SessionStore, StoreError};
use reqwest::Client;
use tokio::fs;
use tokio::sync::RwLock;

const COLLECTION: &str = "objects";

#[derive(Clone)]
pub struct RegistryClient {
    http: Client,
    server_base_url: String,
    cache_path: Option<PathBuf>,
    store: Arc<RwLock<SessionStore>>,
}

impl RegistryClient {
    pub fn new(server_base_url: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            server_base_url: server_base_url.into().trim_end_matches('/').to_string(),
            cache_path: None,
            store: Arc::new(RwLock::new(SessionStore::new())),
        }
    }

    pub fn with_cache_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.cache_path = Some(path.into());
        self
    }

    // At most one hydration per session; the cache file wins over the
    // remote fetch.
    pub async fn hydrate(&self) -> Result<HydrationSource> {
        if self.store.read().await.is_hydrated() {
            return Err(StoreError::AlreadyHydrated.into());
        }

        if let Some(records) = self.read_cache().await? {
            self.store
                .write()
                .await
                .hydrate(records, HydrationSource::LocalCache)?;
            return Ok(HydrationSource::LocalCache);
        }

        let records = self.fetch_all().await?;
        let count = self
            .store
            .write()
            .await
            .hydrate(records, HydrationSource::Remote)?;

        if count > 0 {
            self.persist_cache().await?;
        }

        Ok(HydrationSource::Remote)
    }

    // A validation failure returns before any request is issued.
    pub async fn register(&self, input: FormInput) -> Result<Product> {
        let payload = input.validate()?;
        let url = format!("{}/{COLLECTION}", self.server_base_url);

        let record = self
            .http
            .post(url)
            .json(&payload)
            .send()
            .await
            .with_context(|| format!("failed to create product name={}", payload.name))?
            .error_for_status()
            .with_context(|| format!("server rejected create for name={}", payload.name))?
            .json::<Product>()
            .await
            .context("invalid create response payload")?;

        self.store.write().await.append(record.clone());
        self.persist_cache().await?;

        Ok(record)
    }

    // Returns whether the session store actually held the id.
    pub async fn delete(&self, id: impl AsRef<str>) -> Result<bool> {
        let id = id.as_ref();
        let url = format!("{}/{COLLECTION}/{id}", self.server_base_url);

        self.http
            .delete(url)
            .send()
            .await
            .with_context(|| format!("failed to delete product id={id}"))?
            .error_for_status()
            .with_context(|| format!("server rejected delete for id={id}"))?;

        let removed = self.store.write().await.remove(id);
        self.persist_cache().await?;

        Ok(removed)
    }

    pub async fn fetch_all(&self) -> Result<Vec<Product>> {
        let url = format!("{}/{COLLECTION}", self.server_base_url);

        self.http
            .get(url)
            .send()
            .await
            .context("failed to list products")?
            .error_for_status()
            .context("server rejected product list request")?
            .json::<Vec<Product>>()
            .await
            .context("invalid product list payload")
    }

    pub async fn products(&self) -> Vec<Product> {
        self.store.read().await.records().to_vec()
    }

    pub async fn total(&self) -> usize {
        self.store.read().await.total()
    }

    pub async fn is_hydrated(&self) -> bool {
        self.store.read().await.is_hydrated()
    }

    async fn read_cache(&self) -> Result<Option<Vec<Product>>> {
        let Some(path) = &self.cache_path else {
            return Ok(None);
        };

        if !fs::try_exists(path).await? {
            return Ok(None);
        }

        let payload = fs::read(path)
            .await
            .with_context(|| format!("failed to read product cache: {}", path.display()))?;
        let records = serde_json::from_slice::<Vec<Product>>(&payload)
            .with_context(|| format!("invalid product cache: {}", path.display()))?;

        Ok(Some(records))
    }

    // Rewrites the whole serialized list; skipped while the list is empty,
    // matching the behavior this client replaces.
    async fn persist_cache(&self) -> Result<()> {
        let Some(path) = &self.cache_path else {
            return Ok(());
        };

        let records = self.store.read().await.records().to_vec();
        if records.is_empty() {
            return Ok(());
        }

        let payload = serde_json::to_vec_pretty(&records)?;
        write_atomic(path, &payload)
            .await
            .with_context(|| format!("failed to rewrite product cache: {}", path.display()))
    }
}

async fn write_atomic(path: &Path, payload: &[u8]) -> Result<()> {
    let parent = path
        .parent()
        .with_context(|| format!("path has no parent: {}", path.display()))?;
    if !parent.as_os_str().is_empty() {
        fs::create_dir_all(parent).await?;
    }

    let tmp = path.with_extension(format!(
        "tmp-{}-{}",
        std::process::id(),
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or(0)
    ));

    fs::write(&tmp, payload).await?;
    fs::rename(&tmp, path)
        .await
        .with_context(|| format!("failed to move {} -> {}", tmp.display(), path.display()))?;

    Ok(())
}
