//! Fitted Artifact Loading
//!
//! The scaler and the model are read once at startup. Both must have been
//! fitted on the canonical feature schema; when an artifact carries its column
//! names they are compared against the schema so column drift fails at load
//! time instead of producing plausible but wrong prices.

use crate::{ArtifactError, StandardScaler, TreeEnsemble};
use feature_engine::{FEATURE_COUNT, FEATURE_NAMES};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Locations of the fitted artifacts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArtifactPaths {
    /// Fitted scaler
    pub scaler_path: PathBuf,
    /// Fitted regression model
    pub model_path: PathBuf,
}

impl Default for ArtifactPaths {
    fn default() -> Self {
        Self {
            scaler_path: PathBuf::from("scaler.json"),
            model_path: PathBuf::from("model.json"),
        }
    }
}

/// Read and deserialize a JSON artifact
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, ArtifactError> {
    let bytes = std::fs::read(path).map_err(|source| ArtifactError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    debug!("Read {} bytes from {}", bytes.len(), path.display());
    serde_json::from_slice(&bytes).map_err(|source| ArtifactError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Check an artifact's width and, if present, its column names
pub fn check_schema(
    artifact: &str,
    width: usize,
    names: Option<&[String]>,
) -> Result<(), ArtifactError> {
    if width != FEATURE_COUNT {
        return Err(ArtifactError::SchemaMismatch(format!(
            "{} was fitted on {} columns, schema has {}",
            artifact, width, FEATURE_COUNT
        )));
    }

    if let Some(names) = names {
        if names.len() != FEATURE_COUNT {
            return Err(ArtifactError::SchemaMismatch(format!(
                "{} lists {} column names, schema has {}",
                artifact,
                names.len(),
                FEATURE_COUNT
            )));
        }
        if let Some((i, (got, want))) = names
            .iter()
            .zip(FEATURE_NAMES.iter())
            .enumerate()
            .find(|(_, (got, want))| got.as_str() != **want)
        {
            return Err(ArtifactError::SchemaMismatch(format!(
                "{} column {} is '{}', schema expects '{}'",
                artifact, i, got, want
            )));
        }
    }

    Ok(())
}

/// Load the fitted scaler
pub fn load_scaler(path: &Path) -> Result<StandardScaler, ArtifactError> {
    let scaler: StandardScaler = read_json(path)?;
    scaler.validate()?;
    check_schema("scaler", scaler.n_features(), scaler.feature_names.as_deref())?;
    info!("Loaded scaler from {} ({} columns)", path.display(), scaler.n_features());
    Ok(scaler)
}

/// Load the fitted tree ensemble
pub fn load_model(path: &Path) -> Result<TreeEnsemble, ArtifactError> {
    let model: TreeEnsemble = read_json(path)?;
    check_schema("model", model.n_features(), model.feature_names())?;
    info!(
        "Loaded model from {} ({} trees, {:?} aggregation)",
        path.display(),
        model.n_trees(),
        model.aggregation()
    );
    Ok(model)
}
