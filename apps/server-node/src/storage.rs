use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result};
use common::{NewProduct, Product};
use serde::{Deserialize, Serialize};
use tokio::fs;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredRow {
    #[serde(flatten)]
    record: Product,
    created_at_unix: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct CurrentState {
    rows: Vec<StoredRow>,
}

// The whole table lives in one JSON state file, loaded at init and
// rewritten atomically on every mutation.
pub struct RegistryTable {
    root_dir: PathBuf,
    state_path: PathBuf,
    state: CurrentState,
}

impl RegistryTable {
    pub async fn init(root_dir: impl Into<PathBuf>) -> Result<Self> {
        let root_dir = root_dir.into();
        let state_dir = root_dir.join("state");
        let state_path = state_dir.join("current.json");

        fs::create_dir_all(&state_dir).await?;

        let state = if fs::try_exists(&state_path).await? {
            let payload = fs::read(&state_path).await?;
            serde_json::from_slice::<CurrentState>(&payload)
                .with_context(|| format!("invalid current state: {}", state_path.display()))?
        } else {
            CurrentState::default()
        };

        Ok(Self {
            root_dir,
            state_path,
            state,
        })
    }

    pub fn root_dir(&self) -> &Path {
        &self.root_dir
    }

    pub fn row_count(&self) -> usize {
        self.state.rows.len()
    }

    pub fn list(&self) -> Vec<Product> {
        self.state.rows.iter().map(|row| row.record.clone()).collect()
    }

    pub async fn insert(&mut self, payload: NewProduct) -> Result<Product> {
        let record = Product {
            id: Uuid::new_v4().to_string(),
            name: payload.name,
            details: Some(payload.details),
        };

        self.state.rows.push(StoredRow {
            record: record.clone(),
            created_at_unix: unix_ts(),
        });
        self.persist_current_state().await?;

        Ok(record)
    }

    pub async fn remove(&mut self, id: &str) -> Result<bool> {
        let before = self.state.rows.len();
        self.state.rows.retain(|row| row.record.id != id);

        if self.state.rows.len() == before {
            return Ok(false);
        }

        self.persist_current_state().await?;
        Ok(true)
    }

    async fn persist_current_state(&self) -> Result<()> {
        let payload = serde_json::to_vec_pretty(&self.state)?;
        write_atomic(&self.state_path, &payload).await
    }
}

fn unix_ts() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

async fn write_atomic(path: &Path, payload: &[u8]) -> Result<()> {
    let parent = path
        .parent()
        .with_context(|| format!("path has no parent: {}", path.display()))?;
    fs::create_dir_all(parent).await?;

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
