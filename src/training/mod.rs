//! Model selection and training.
//!
//! The seasonal model is chosen by walk-forward cross-validated grid search;
//! the decision forest is scored on chronological holdout blocks.

pub mod cross_validation;
pub mod forest_trainer;
pub mod trainer;

pub use cross_validation::{walk_forward_mae, CVResults, FoldWindow, WalkForwardPolicy};
pub use forest_trainer::{ForestMeta, ForestMetrics, ForestSplit, ForestTrainer, TrainedForest};
pub use trainer::{CandidateScore, SeasonalModelMeta, SeasonalTrainer, TrainedSeasonalModel};

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which forecaster a city is trained for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelKind {
    Seasonal,
    Forest,
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Seasonal => write!(f, "seasonal"),
            Self::Forest => write!(f, "forest"),
        }
    }
}

/// Output of either trainer.
#[derive(Debug, Clone, PartialEq)]
pub enum TrainedModel {
    Seasonal(TrainedSeasonalModel),
    Forest(TrainedForest),
}

impl TrainedModel {
    pub fn kind(&self) -> ModelKind {
        match self {
            Self::Seasonal(_) => ModelKind::Seasonal,
            Self::Forest(_) => ModelKind::Forest,
        }
    }

    /// Training metadata as JSON.
    pub fn meta_json(&self) -> Result<serde_json::Value> {
        Ok(match self {
            Self::Seasonal(m) => serde_json::to_value(&m.meta)?,
            Self::Forest(m) => serde_json::to_value(&m.meta)?,
        })
    }
}

impl From<TrainedSeasonalModel> for TrainedModel {
    fn from(model: TrainedSeasonalModel) -> Self {
        Self::Seasonal(model)
    }
}

impl From<TrainedForest> for TrainedModel {
    fn from(model: TrainedForest) -> Self {
        Self::Forest(model)
    }
}
