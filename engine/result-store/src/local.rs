//! Local file-based result store
//!
//! One pretty-printed JSON file per key under `coefficients/` or `playoff/`,
//! written to a temporary file and renamed into place. `manifest.json`
//! records what was committed and when; row files never carry timestamps,
//! so committing identical artifacts twice leaves them byte-identical.

use crate::backend::{check_key, ArtifactKind, ResultStore};
use crate::config::StoreConfig;
use crate::error::{Result, StoreError};
use chrono::{DateTime, Utc};
use coe_core::{CoefficientRun, PlayoffRun, RunKey};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub kind: ArtifactKind,
    pub key: RunKey,
    pub file: String,
    pub rows: usize,
    pub committed_at: DateTime<Utc>,
}

/// Commit log of a local store, keyed by `<kind>/<slug>`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    pub entries: BTreeMap<String, ManifestEntry>,
}

pub struct LocalStore {
    config: StoreConfig,
    manifest: Mutex<Manifest>,
}

impl LocalStore {
    /// Open (creating if needed) a store rooted at `config.data_dir`
    pub async fn open(config: StoreConfig) -> Result<Self> {
        config.validate().map_err(StoreError::config)?;
        tokio::fs::create_dir_all(config.coefficients_dir()).await?;
        tokio::fs::create_dir_all(config.playoff_dir()).await?;

        let manifest = match tokio::fs::read(config.manifest_path()).await {
            Ok(bytes) => serde_json::from_slice(&bytes)?,
            Err(err) if err.kind() == ErrorKind::NotFound => Manifest::default(),
            Err(err) => return Err(err.into()),
        };
        tracing::info!("Local result store opened at {:?}", config.data_dir);
        Ok(Self { config, manifest: Mutex::new(manifest) })
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub fn data_dir(&self) -> &Path {
        &self.config.data_dir
    }

    pub async fn manifest(&self) -> Manifest {
        self.manifest.lock().await.clone()
    }

    /// Path of the row file for a key
    pub fn path_for(&self, kind: ArtifactKind, key: &RunKey) -> PathBuf {
        let dir = match kind {
            ArtifactKind::Coefficients => self.config.coefficients_dir(),
            ArtifactKind::Playoff => self.config.playoff_dir(),
        };
        dir.join(format!("{}.json", key.slug()))
    }

    async fn commit<T: Serialize>(&self, kind: ArtifactKind, key: &RunKey, artifacts: &T, rows: usize) -> Result<()> {
        check_key(kind, key)?;
        let path = self.path_for(kind, key);
        let mut bytes = serde_json::to_vec_pretty(artifacts)?;
        bytes.push(b'\n');

        // The manifest lock serializes commits
        let mut manifest = self.manifest.lock().await;
        write_atomic(&path, &bytes).await?;

        let file = path
            .file_name()
            .and_then(|name| name.to_str())
            .map(str::to_string)
            .ok_or_else(|| StoreError::invalid_key(format!("{key} has no file name")))?;
        manifest.entries.insert(
            format!("{kind}/{}", key.slug()),
            ManifestEntry { kind, key: key.clone(), file, rows, committed_at: Utc::now() },
        );
        write_atomic(&self.config.manifest_path(), &serde_json::to_vec_pretty(&*manifest)?).await?;

        tracing::info!("Committed {kind} {key}: {rows} rows to {:?}", path);
        Ok(())
    }

    async fn load<T: DeserializeOwned>(&self, kind: ArtifactKind, key: &RunKey) -> Result<T> {
        check_key(kind, key)?;
        let path = self.path_for(kind, key);
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(err) if err.kind() == ErrorKind::NotFound => Err(StoreError::not_found(format!("{kind} {key}"))),
            Err(err) => Err(err.into()),
        }
    }
}

/// Write through a sibling `.tmp` file; the temporary is removed if the write or rename fails
async fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    let written = match tokio::fs::write(&tmp, bytes).await {
        Ok(()) => tokio::fs::rename(&tmp, path).await,
        Err(err) => Err(err),
    };
    if let Err(err) = written {
        if let Err(cleanup) = tokio::fs::remove_file(&tmp).await {
            tracing::warn!("Failed to remove temporary file {}: {cleanup}", tmp.display());
        }
        return Err(err.into());
    }
    Ok(())
}

#[async_trait::async_trait]
impl ResultStore for LocalStore {
    async fn commit_coefficients(&self, run: &CoefficientRun) -> Result<()> {
        let rows = run.components.len() + run.season_coefficients.len() + run.rolling_coefficients.len();
        self.commit(ArtifactKind::Coefficients, &run.key, run, rows).await
    }

    async fn load_coefficients(&self, key: &RunKey) -> Result<CoefficientRun> {
        self.load(ArtifactKind::Coefficients, key).await
    }

    async fn commit_playoff(&self, run: &PlayoffRun) -> Result<()> {
        let rows = run.qualifiers.len() + run.pots.len() + run.bracket.slots.len();
        self.commit(ArtifactKind::Playoff, &run.key, run, rows).await
    }

    async fn load_playoff(&self, key: &RunKey) -> Result<PlayoffRun> {
        self.load(ArtifactKind::Playoff, key).await
    }

    async fn list_keys(&self) -> Result<Vec<(ArtifactKind, RunKey)>> {
        let manifest = self.manifest.lock().await;
        let mut keys: Vec<(ArtifactKind, RunKey)> =
            manifest.entries.values().map(|entry| (entry.kind, entry.key.clone())).collect();
        keys.sort();
        Ok(keys)
    }
}
