//! On-disk model artifacts.
//!
//! Each trained city owns `<root>/<city_key>/` holding `model.json` (fitted
//! state, tagged with its [`ModelKind`]) and `meta.json` (training metadata).
//! A save replaces both files; readers never observe a half-written pair
//! because each file is written to a temporary sibling and renamed.

use crate::core::validate_key;
use crate::error::{InsightsError, Result};
use crate::models::{RandomForest, SarimaxModel};
use crate::training::{
    ForestMeta, ModelKind, SeasonalModelMeta, TrainedForest, TrainedModel, TrainedSeasonalModel,
};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

pub const MODEL_FILE: &str = "model.json";
pub const META_FILE: &str = "meta.json";

#[derive(Serialize, Deserialize)]
#[serde(tag = "kind", content = "state", rename_all = "snake_case")]
enum StoredModel {
    Seasonal(SarimaxModel),
    Forest(RandomForest),
}

/// Filesystem store of per-city model artifacts.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    root: PathBuf,
}

impl ArtifactStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory of one city's artifacts; malformed keys are
    /// [`InsightsError::InputValidation`].
    pub fn city_dir(&self, city_key: &str) -> Result<PathBuf> {
        Ok(self.root.join(validate_key(city_key)?))
    }

    pub fn exists(&self, city_key: &str) -> bool {
        self.city_dir(city_key)
            .map(|dir| dir.join(MODEL_FILE).is_file() && dir.join(META_FILE).is_file())
            .unwrap_or(false)
    }

    /// Write the model and its metadata, replacing any previous artifacts.
    pub fn save(&self, city_key: &str, trained: &TrainedModel) -> Result<PathBuf> {
        let dir = self.city_dir(city_key)?;
        fs::create_dir_all(&dir)
            .map_err(|e| InsightsError::Persistence(format!("creating {}: {e}", dir.display())))?;

        let (state, meta) = match trained {
            TrainedModel::Seasonal(m) => (
                serde_json::to_vec(&StoredModel::Seasonal(m.model.clone()))?,
                serde_json::to_vec_pretty(&m.meta)?,
            ),
            TrainedModel::Forest(m) => (
                serde_json::to_vec(&StoredModel::Forest(m.forest.clone()))?,
                serde_json::to_vec_pretty(&m.meta)?,
            ),
        };

        let model_tmp = write_temp(&dir, MODEL_FILE, &state)?;
        let meta_tmp = write_temp(&dir, META_FILE, &meta)?;
        rename(&model_tmp, &dir.join(MODEL_FILE))?;
        rename(&meta_tmp, &dir.join(META_FILE))?;

        debug!(city = city_key, kind = %trained.kind(), dir = %dir.display(), "saved model artifacts");
        Ok(dir)
    }

    /// Load a city's model; missing artifacts are [`InsightsError::NotFound`].
    pub fn load(&self, city_key: &str) -> Result<TrainedModel> {
        let dir = self.city_dir(city_key)?;
        if !self.exists(city_key) {
            return Err(InsightsError::NotFound(format!(
                "no trained model for '{city_key}'; ingest history and train the city first"
            )));
        }
        let state: StoredModel = serde_json::from_slice(&read(&dir.join(MODEL_FILE))?)?;
        let meta = read(&dir.join(META_FILE))?;

        Ok(match state {
            StoredModel::Seasonal(model) => {
                let meta: SeasonalModelMeta = serde_json::from_slice(&meta)?;
                TrainedModel::Seasonal(TrainedSeasonalModel { model, meta })
            }
            StoredModel::Forest(forest) => {
                let meta: ForestMeta = serde_json::from_slice(&meta)?;
                TrainedModel::Forest(TrainedForest { forest, meta })
            }
        })
    }

    /// Kind of the stored model.
    pub fn kind(&self, city_key: &str) -> Result<ModelKind> {
        Ok(self.load(city_key)?.kind())
    }
}

fn write_temp(dir: &Path, name: &str, bytes: &[u8]) -> Result<PathBuf> {
    let tmp = dir.join(format!(".{name}.tmp"));
    fs::write(&tmp, bytes)
        .map_err(|e| InsightsError::Persistence(format!("writing {}: {e}", tmp.display())))?;
    Ok(tmp)
}

fn rename(from: &Path, to: &Path) -> Result<()> {
    fs::rename(from, to)
        .map_err(|e| InsightsError::Persistence(format!("replacing {}: {e}", to.display())))
}

fn read(path: &Path) -> Result<Vec<u8>> {
    fs::read(path).map_err(|e| InsightsError::Persistence(format!("reading {}: {e}", path.display())))
}
