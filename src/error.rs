// EcoFlow - Smart intersection decision engine
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Error types for EcoFlow
//!
//! The decision core is total: classification, normalization and policy
//! decisions never fail. Errors only surface at the collaborator edges
//! (configuration files and persisted model artifacts).

use thiserror::Error;

/// Result type alias for EcoFlow operations
pub type Result<T> = std::result::Result<T, EcoflowError>;

/// Main error type for EcoFlow operations
#[derive(Error, Debug)]
pub enum EcoflowError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Model artifact error
    #[error("Artifact error: {0}")]
    Artifact(#[from] ArtifactError),
}

/// Errors in a configuration value
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// Sample interval must be a positive number of minutes
    #[error("Invalid sample interval: {minutes} minutes")]
    InvalidSampleInterval { minutes: u32 },

    /// Rate ceiling must be positive and finite
    #[error("Invalid rate ceiling: {value}")]
    InvalidRateCeiling { value: f64 },

    /// Extended green must not be shorter than standard green
    #[error("Extended green ({extended}s) shorter than standard green ({standard}s)")]
    GreenDurationOrder { standard: u32, extended: u32 },

    /// Config file could not be read
    #[error("Cannot read config {path}: {reason}")]
    Unreadable { path: String, reason: String },

    /// Config file could not be parsed
    #[error("Cannot parse config: {0}")]
    Parse(String),
}

/// Errors while saving or loading a model artifact
#[derive(Error, Debug)]
pub enum ArtifactError {
    /// Artifact file does not exist
    #[error("Model file not found: {0}")]
    NotFound(String),

    /// Filesystem error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON encoding or decoding error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Nothing trained, nothing to save
    #[error("No trained model to save")]
    Untrained,
}
