// EcoFlow - Smart intersection decision engine
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Persisted model artifacts
//!
//! A trained predictor is saved as a single JSON document holding metadata
//! and the serialized forecasters.

use crate::config::PredictionConfig;
use crate::error::{ArtifactError, Result};
use crate::forecast::Forecaster;
use crate::predictor::TrafficPredictor;
use crate::profile::SeasonalProfileForecaster;
use chrono::NaiveDateTime;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Artifact metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelMetadata {
    /// When training ran
    pub trained_at: Option<NaiveDateTime>,
    /// Identifier of the sensor the data came from
    pub source_identifier: Option<String>,
    /// Whether per-direction models are included
    pub has_direction_models: bool,
    /// Sampling interval the models were trained on (minutes)
    pub sample_interval_minutes: u32,
    /// Crate version that wrote the artifact
    pub format_version: String,
}

/// Metadata plus trained forecasters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelArtifact<F = SeasonalProfileForecaster> {
    pub metadata: ModelMetadata,
    pub total: F,
    pub directions: Option<(F, F)>,
}

impl<F: Forecaster + Clone> ModelArtifact<F> {
    /// Capture a trained predictor
    pub fn from_predictor(predictor: &TrafficPredictor<F>) -> Result<Self> {
        if !predictor.is_trained() {
            return Err(ArtifactError::Untrained.into());
        }
        let directions = predictor.direction_models().cloned();
        Ok(Self {
            metadata: ModelMetadata {
                trained_at: predictor.trained_at(),
                source_identifier: predictor.source_id().map(str::to_string),
                has_direction_models: directions.is_some(),
                sample_interval_minutes: predictor.config().sample_interval_minutes,
                format_version: crate::VERSION.to_string(),
            },
            total: predictor.total_model().clone(),
            directions,
        })
    }

    /// Rebuild a predictor.
    ///
    /// The artifact's sampling interval overrides the one in `config`.
    pub fn into_predictor(self, mut config: PredictionConfig) -> TrafficPredictor<F> {
        config.sample_interval_minutes = self.metadata.sample_interval_minutes;
        TrafficPredictor::from_models(
            config,
            self.total,
            self.directions,
            self.metadata.trained_at,
            self.metadata.source_identifier,
        )
    }
}

impl<F: Serialize> ModelArtifact<F> {
    /// Write the artifact as pretty JSON
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self).map_err(ArtifactError::from)?;
        fs::write(path, json).map_err(ArtifactError::from)?;
        log::info!("Model saved to {}", path.display());
        Ok(())
    }
}

impl<F: DeserializeOwned> ModelArtifact<F> {
    /// Read an artifact written by [`ModelArtifact::save`]
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ArtifactError::NotFound(path.display().to_string()).into());
        }
        let json = fs::read_to_string(path).map_err(ArtifactError::from)?;
        let artifact: Self = serde_json::from_str(&json).map_err(ArtifactError::from)?;
        log::info!("Model loaded from {}", path.display());
        Ok(artifact)
    }
}
