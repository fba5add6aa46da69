//! Lumen Headless Backend
//!
//! CPU-resident implementation of the `lumen-scene` backend hooks. Materials
//! pack their parameters into uniform blocks and submeshes keep geometry and
//! uploaded uniform bytes in memory, so the full mesh/material lifecycle can
//! run and be inspected without a graphics device.
//!
//! # Architecture
//!
//! - [`scene::HeadlessScene`] - Material registry and object factory
//! - [`material::HeadlessMaterial`] - Parameters, animation clock and uniform block
//! - [`ops::HeadlessSubMeshOps`] / [`ops::HeadlessMeshOps`] - Backend hooks
//! - [`config::ConfigManager`] - RON configuration file
//! - [`description::SceneDescription`] - RON scene files driving a whole lifecycle
//!
//! # Example
//!
//! ```ignore
//! use lumen_headless::{HeadlessScene, SceneDescription};
//!
//! let scene = HeadlessScene::default();
//! let stats = SceneDescription::sample().apply(&scene)?;
//! assert_eq!(stats.cloned, stats.destroyed);
//! ```

pub mod config;
pub mod description;
pub mod material;
pub mod ops;
pub mod scene;

// Re-exports for convenience
pub use config::{ConfigError, ConfigManager, HeadlessConfig};
pub use description::{
    DescriptionError, MaterialDesc, MeshDesc, SceneDescription, Shape, SubMeshDesc,
};
pub use material::{
    HEADLESS, HeadlessMaterial, MaterialParams, MaterialUniform, Pulse, as_headless,
};
pub use ops::{Geometry, HeadlessMesh, HeadlessMeshOps, HeadlessSubMesh, HeadlessSubMeshOps};
pub use scene::{HeadlessScene, ResourceStats};
