//! Result store trait and the in-memory backend

use crate::error::{Result, StoreError};
use coe_core::{CoefficientRun, PlayoffRun, RunKey};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Kind of artifact set committed under a key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    Coefficients,
    Playoff,
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Coefficients => f.write_str("coefficients"),
            Self::Playoff => f.write_str("playoff"),
        }
    }
}

/// Replace-by-key storage for complete run artifacts.
///
/// A commit replaces everything previously stored under its key; partial
/// artifact sets are never written.
#[async_trait::async_trait]
pub trait ResultStore: Send + Sync {
    async fn commit_coefficients(&self, run: &CoefficientRun) -> Result<()>;

    async fn load_coefficients(&self, key: &RunKey) -> Result<CoefficientRun>;

    async fn commit_playoff(&self, run: &PlayoffRun) -> Result<()>;

    async fn load_playoff(&self, key: &RunKey) -> Result<PlayoffRun>;

    /// Every committed key with its artifact kind, in key order
    async fn list_keys(&self) -> Result<Vec<(ArtifactKind, RunKey)>>;
}

/// Check that `key` names an artifact of `kind` and is usable as a file name
pub fn check_key(kind: ArtifactKind, key: &RunKey) -> Result<()> {
    match (kind, &key.ruleset) {
        (ArtifactKind::Coefficients, Some(_)) => {
            return Err(StoreError::invalid_key(format!("coefficient key {key} carries a ruleset")))
        }
        (ArtifactKind::Playoff, None) => {
            return Err(StoreError::invalid_key(format!("playoff key {key} has no ruleset")))
        }
        _ => {}
    }
    let parts = std::iter::once(key.formula_version.as_str()).chain(key.ruleset.as_ref().map(|r| r.as_str()));
    for part in parts {
        let valid = !part.is_empty() && part.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '.');
        if !valid || part.starts_with('.') {
            return Err(StoreError::invalid_key(format!("'{part}' in {key} is not a valid file name part")));
        }
    }
    Ok(())
}

/// In-memory backend, mainly for tests and dry runs
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    coefficients: Arc<Mutex<BTreeMap<RunKey, CoefficientRun>>>,
    playoffs: Arc<Mutex<BTreeMap<RunKey, PlayoffRun>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl ResultStore for InMemoryStore {
    async fn commit_coefficients(&self, run: &CoefficientRun) -> Result<()> {
        check_key(ArtifactKind::Coefficients, &run.key)?;
        self.coefficients.lock().await.insert(run.key.clone(), run.clone());
        tracing::debug!("Committed coefficients {} in memory", run.key);
        Ok(())
    }

    async fn load_coefficients(&self, key: &RunKey) -> Result<CoefficientRun> {
        self.coefficients
            .lock()
            .await
            .get(key)
            .cloned()
            .ok_or_else(|| StoreError::not_found(format!("coefficients {key}")))
    }

    async fn commit_playoff(&self, run: &PlayoffRun) -> Result<()> {
        check_key(ArtifactKind::Playoff, &run.key)?;
        self.playoffs.lock().await.insert(run.key.clone(), run.clone());
        tracing::debug!("Committed playoff {} in memory", run.key);
        Ok(())
    }

    async fn load_playoff(&self, key: &RunKey) -> Result<PlayoffRun> {
        self.playoffs
            .lock()
            .await
            .get(key)
            .cloned()
            .ok_or_else(|| StoreError::not_found(format!("playoff {key}")))
    }

    async fn list_keys(&self) -> Result<Vec<(ArtifactKind, RunKey)>> {
        let mut keys: Vec<(ArtifactKind, RunKey)> = self
            .coefficients
            .lock()
            .await
            .keys()
            .map(|key| (ArtifactKind::Coefficients, key.clone()))
            .collect();
        keys.extend(self.playoffs.lock().await.keys().map(|key| (ArtifactKind::Playoff, key.clone())));
        keys.sort();
        Ok(keys)
    }
}
