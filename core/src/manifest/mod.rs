//! Deployment manifest builder
//!
//! Maps a [`DeploymentConfig`] to the declarative service / profile /
//! placement document the marketplace accepts, and parses such documents
//! back.

pub mod config;
pub mod document;
pub mod render;

pub use config::{
    ComputeResources, DeploymentConfig, EnvVar, PortMapping, DEFAULT_CPU_UNITS, DEFAULT_DURATION,
    DEFAULT_MEMORY, DEFAULT_REPLICAS, DEFAULT_STORAGE,
};
pub use document::Manifest;
pub use render::{render, save_manifest, write_manifest, MANIFEST_FILE_NAME};
