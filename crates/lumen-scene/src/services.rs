//! Scene services consumed by meshes and submeshes.

use std::sync::Arc;

use crate::material::MaterialPtr;

/// Shared handle to the owning scene's material services.
pub type SharedServices = Arc<dyn MaterialServices>;

/// Material registry and destroy capability of the owning scene.
///
/// Injected into every mesh and submesh at construction.
pub trait MaterialServices: Send + Sync {
    /// Looks up a registered material by name.
    fn material(&self, name: &str) -> Option<MaterialPtr>;

    /// Releases a material and its backend resources.
    ///
    /// Must be called at most once per live material.
    fn destroy_material(&self, material: &MaterialPtr);
}
