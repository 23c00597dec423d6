//! Scoring artifact: schema, classifier, provisioning and scoring

pub mod artifact;
pub mod forest;
pub mod provider;
pub mod scaler;
pub mod scorer;
pub mod training;

pub use artifact::{ArtifactError, ScoringArtifact};
pub use provider::{ArtifactSource, ModelProvider};
pub use scorer::{Score, Scorer};
