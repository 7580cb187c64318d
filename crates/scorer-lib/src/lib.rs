//! Scoring library for the diabetes risk model
//!
//! This crate provides the core functionality for:
//! - Loading the trained classifier and its feature schema
//! - Normalizing caller input into a table and aligning it to the schema
//! - Running inference and shaping the structured response
//! - Risk tiering, health checks and observability

pub mod artifacts;
pub mod classifier;
pub mod error;
pub mod health;
pub mod models;
pub mod observability;
pub mod risk;
pub mod schema;
pub mod scorer;
pub mod table;

pub use artifacts::{ArtifactPaths, ArtifactStore, Artifacts, DEFAULT_FEATURES_PATH, DEFAULT_MODEL_PATH};
pub use classifier::{Classifier, FeatureMatrix};
pub use error::ScoreError;
pub use health::{
    ComponentHealth, ComponentStatus, HealthRegistry, HealthResponse, ReadinessResponse,
};
pub use models::*;
pub use observability::{ScorerMetrics, StructuredLogger};
pub use risk::{RiskAssessment, RiskTier};
pub use schema::FeatureSchema;
pub use scorer::Scorer;
pub use table::Table;
