//! # Result Store
//!
//! Durable, replace-by-key storage for the artifacts of coefficient and
//! playoff runs.
//!
//! - **ResultStore**: async trait implemented by every backend
//! - **InMemoryStore**: process-local backend for tests and dry runs
//! - **LocalStore**: one JSON file per key plus a commit manifest
//!
//! ```rust,ignore
//! use result_store::{LocalStore, ResultStore, StoreConfig};
//!
//! let store = LocalStore::open(StoreConfig::new("./data/results")).await?;
//! store.commit_coefficients(&run).await?;
//! let again = store.load_coefficients(&run.key).await?;
//! ```

pub mod backend;
pub mod config;
pub mod error;
pub mod local;


pub use backend::{check_key, ArtifactKind, InMemoryStore, ResultStore};
pub use config::StoreConfig;
pub use error::{Result, StoreError};
pub use local::{LocalStore, Manifest, ManifestEntry};
