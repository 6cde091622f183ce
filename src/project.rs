//! Project snapshots: the full scene plus export choices as one JSON file.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::export::{ExportQuality, ExportRatio};
use crate::settings::Scene;

pub const PROJECT_VERSION: u32 = 1;

#[derive(Debug, thiserror::Error)]
pub enum ProjectError {
    #[error("read project {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("write project {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("parse project: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ExportChoices {
    pub ratio: ExportRatio,
    pub quality: ExportQuality,
    pub fps: u32,
}

impl Default for ExportChoices {
    fn default() -> Self {
        Self {
            ratio: ExportRatio::default(),
            quality: ExportQuality::default(),
            fps: 60,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ProjectSnapshot {
    pub version: u32,
    pub name: String,
    pub export: ExportChoices,
    #[serde(flatten)]
    pub scene: Scene,
}

impl Default for ProjectSnapshot {
    fn default() -> Self {
        Self {
            version: PROJECT_VERSION,
            name: String::new(),
            export: ExportChoices::default(),
            scene: Scene::default(),
        }
    }
}

impl ProjectSnapshot {
    pub fn from_json(raw: &str) -> Result<Self, ProjectError> {
        let snapshot: Self = serde_json::from_str(raw)?;
        if snapshot.version > PROJECT_VERSION {
            warn!(
                version = snapshot.version,
                supported = PROJECT_VERSION,
                "project written by a newer version; unknown fields are ignored"
            );
        }
        Ok(snapshot)
    }

    pub fn to_json(&self) -> Result<String, ProjectError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn load(path: &Path) -> Result<Self, ProjectError> {
        let raw = fs::read_to_string(path).map_err(|source| ProjectError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let snapshot = Self::from_json(&raw)?;
        debug!(path = %path.display(), name = %snapshot.name, "loaded project");
        Ok(snapshot)
    }

    pub fn save(&self, path: &Path) -> Result<(), ProjectError> {
        let raw = self.to_json()?;
        fs::write(path, raw).map_err(|source| ProjectError::Write {
            path: path.to_path_buf(),
            source,
        })
    }
}
