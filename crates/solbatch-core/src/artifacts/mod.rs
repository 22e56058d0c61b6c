//! Build artifacts: the persisted per-construct records and the change
//! detection that reads them back
//!
//! One JSON artifact is written per compiled construct. Each records the
//! fingerprint of every file the construct's source was compiled with, so
//! the next run can decide without invoking the compiler whether anything
//! changed.

mod artifact;
mod detector;
mod error;
mod hash;
mod store;

pub use artifact::{ArtifactSource, BuildArtifact, CompilerRecord};
pub use detector::{ChangeDetector, Classification};
pub use error::{ArtifactError, Result};
pub use hash::{fingerprint, hash_settings};
pub use store::ArtifactStore;

/// Artifact file extension
pub const ARTIFACT_EXTENSION: &str = "json";
