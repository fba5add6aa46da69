//! Material capability shared by all backends.

use std::any::Any;
use std::sync::Arc;

use uuid::Uuid;

use crate::backend::BackendTag;
use crate::error::{SceneError, SceneResult};

/// Shared reference to a backend material.
///
/// Identity matters: two references are the same material only if they point
/// at the same instance (see [`same_material`]).
pub type MaterialPtr = Arc<dyn Material>;

/// A backend GPU resource describing surface appearance.
///
/// Materials are created and destroyed through the scene. The core only
/// needs to clone them, tick them once per frame and read their identity.
pub trait Material: Send + Sync {
    /// Unique identifier of this instance.
    fn id(&self) -> Uuid;

    /// Registry name of this instance.
    fn name(&self) -> &str;

    /// Backend that created this material.
    fn backend(&self) -> BackendTag;

    /// Creates an independent copy with its own backend state.
    ///
    /// The copy is registered with the same scene and must eventually be
    /// destroyed by whoever receives it.
    fn clone_material(&self) -> SceneResult<MaterialPtr>;

    /// Per-frame update of animated parameters.
    fn pre_render(&self);

    /// Returns true once the scene has destroyed this material.
    fn is_destroyed(&self) -> bool;

    /// Concrete type access for the owning backend, after [`ensure_backend`].
    fn as_any(&self) -> &dyn Any;
}

/// Returns true if both references point at the same material instance.
pub fn same_material(a: &MaterialPtr, b: &MaterialPtr) -> bool {
    Arc::ptr_eq(a, b)
}

/// Checks that `material` was created by the `expected` backend.
pub fn ensure_backend(material: &MaterialPtr, expected: BackendTag) -> SceneResult<()> {
    let found = material.backend();
    if found != expected {
        return Err(SceneError::BackendMismatch {
            material: material.name().to_string(),
            expected,
            found,
        });
    }
    if material.is_destroyed() {
        return Err(SceneError::MaterialDestroyed(material.name().to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Recorder, TEST_BACKEND, TestMaterial};

    #[test]
    fn test_same_material_is_identity() {
        let recorder = Recorder::new();
        let a = TestMaterial::create(&recorder, "a");
        let b = TestMaterial::create(&recorder, "a");

        assert!(same_material(&a, &a.clone()));
        assert!(!same_material(&a, &b));
    }

    #[test]
    fn test_ensure_backend() {
        let recorder = Recorder::new();
        let own = TestMaterial::create(&recorder, "own");
        let foreign = TestMaterial::create_for(&recorder, "foreign", BackendTag::new("other"));

        assert!(ensure_backend(&own, TEST_BACKEND).is_ok());
        assert!(matches!(
            ensure_backend(&foreign, TEST_BACKEND),
            Err(SceneError::BackendMismatch { .. })
        ));
    }
}
