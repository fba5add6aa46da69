//! Submesh: a piece of geometry with exactly one material.

use std::sync::Arc;

use parking_lot::RwLock;
use uuid::Uuid;

use crate::backend::{BackendTag, ObjectState};
use crate::error::{SceneError, SceneResult};
use crate::material::{MaterialPtr, ensure_backend, same_material};
use crate::services::SharedServices;

/// Backend-neutral submesh interface.
pub trait SubMesh: Send + Sync {
    /// Unique identifier of this submesh.
    fn id(&self) -> Uuid;

    /// Name of this submesh (may be empty).
    fn name(&self) -> &str;

    /// Current lifecycle state.
    fn state(&self) -> ObjectState;

    /// Material currently applied to the geometry.
    fn material(&self) -> Option<MaterialPtr>;

    /// Returns true if this submesh must destroy its material.
    fn owns_material(&self) -> bool;

    /// Checks whether the backend would accept `material`, without applying it.
    fn check_material(&self, material: &MaterialPtr) -> SceneResult<()>;

    /// Applies a material.
    ///
    /// With `unique` set, the material is cloned first and this submesh owns
    /// the clone. On error the previous material stays applied.
    fn set_material(&mut self, material: MaterialPtr, unique: bool) -> SceneResult<()>;

    /// Applies the scene material registered under `name`.
    ///
    /// Unknown names are ignored.
    fn set_material_by_name(&mut self, name: &str, unique: bool) -> SceneResult<()>;

    /// Per-frame preparation.
    fn pre_render(&mut self);

    /// Tears the submesh down. Repeated calls do nothing.
    fn destroy(&mut self);
}

/// Backend hooks for a submesh.
pub trait SubMeshBackend: Send + Sync {
    /// Backend this submesh belongs to.
    fn backend(&self) -> BackendTag;

    /// Rejects materials this backend cannot bind.
    fn check_material(&self, material: &MaterialPtr) -> SceneResult<()> {
        ensure_backend(material, self.backend())
    }

    /// Binds `material` to the backend geometry.
    fn apply_material(&mut self, material: &MaterialPtr) -> SceneResult<()>;

    /// Backend frame preparation.
    fn pre_render(&mut self) {}

    /// Releases backend resources.
    fn destroy(&mut self) {}
}

/// Submesh implementation shared by all backends.
///
/// Holds the material bookkeeping and delegates the GPU side to `B`.
pub struct BaseSubMesh<B: SubMeshBackend> {
    id: Uuid,
    name: String,
    services: SharedServices,
    ops: B,
    material: Option<MaterialPtr>,
    owns_material: bool,
    state: ObjectState,
}

impl<B: SubMeshBackend> BaseSubMesh<B> {
    /// Creates a submesh with no material.
    pub fn new(name: impl Into<String>, services: SharedServices, ops: B) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            services,
            ops,
            material: None,
            owns_material: false,
            state: ObjectState::Active,
        }
    }

    /// Wraps the submesh in a shared handle.
    pub fn into_shared(self) -> Arc<RwLock<Self>> {
        Arc::new(RwLock::new(self))
    }

    /// Backend hooks of this submesh.
    pub fn ops(&self) -> &B {
        &self.ops
    }

    /// Mutable access to the backend hooks.
    pub fn ops_mut(&mut self) -> &mut B {
        &mut self.ops
    }
}

impl<B: SubMeshBackend> SubMesh for BaseSubMesh<B> {
    fn id(&self) -> Uuid {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn state(&self) -> ObjectState {
        self.state
    }

    fn material(&self) -> Option<MaterialPtr> {
        self.material.clone()
    }

    fn owns_material(&self) -> bool {
        self.owns_material
    }

    fn check_material(&self, material: &MaterialPtr) -> SceneResult<()> {
        self.ops.check_material(material)
    }

    fn set_material(&mut self, material: MaterialPtr, unique: bool) -> SceneResult<()> {
        if self.state.is_destroyed() {
            return Err(SceneError::ObjectDestroyed(self.name.clone()));
        }

        if let Err(err) = self.ops.check_material(&material) {
            tracing::error!("Submesh '{}' rejected material: {}", self.name, err);
            return Err(err);
        }

        let material = if unique {
            material.clone_material()?
        } else {
            material
        };

        if let Err(err) = self.ops.apply_material(&material) {
            tracing::error!(
                "Failed to apply material '{}' to submesh '{}': {}",
                material.name(),
                self.name,
                err
            );
            if unique {
                self.services.destroy_material(&material);
            }
            return Err(err);
        }

        match self.material.take() {
            // Re-applying the held instance keeps its ownership
            Some(previous) if same_material(&previous, &material) => {
                self.material = Some(previous);
                return Ok(());
            }
            Some(previous) if self.owns_material => {
                self.services.destroy_material(&previous);
            }
            _ => {}
        }

        tracing::debug!(
            "Submesh '{}' now uses material '{}' (owned: {})",
            self.name,
            material.name(),
            unique
        );
        self.material = Some(material);
        self.owns_material = unique;
        Ok(())
    }

    fn set_material_by_name(&mut self, name: &str, unique: bool) -> SceneResult<()> {
        match self.services.material(name) {
            Some(material) => self.set_material(material, unique),
            None => {
                tracing::debug!("Material '{}' not found, submesh '{}' unchanged", name, self.name);
                Ok(())
            }
        }
    }

    fn pre_render(&mut self) {
        if self.state.is_destroyed() {
            return;
        }

        self.ops.pre_render();
        if let Some(material) = &self.material {
            material.pre_render();
        }
    }

    fn destroy(&mut self) {
        if self.state.is_destroyed() {
            return;
        }

        self.ops.destroy();
        if let Some(material) = self.material.take()
            && self.owns_material
        {
            self.services.destroy_material(&material);
        }
        self.owns_material = false;
        self.state = ObjectState::Destroyed;
        tracing::debug!("Destroyed submesh '{}'", self.name);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Event, Recorder, TestMaterial, test_sub_mesh};

    #[test]
    fn test_unique_assignment_clones_then_destroys_previous() {
        let recorder = Recorder::new();
        let services = recorder.services();
        let sub_mesh = test_sub_mesh(&recorder, &services, "body");
        let a = TestMaterial::create(&recorder, "a");
        let b = TestMaterial::create(&recorder, "b");

        sub_mesh.write().set_material(a.clone(), true).unwrap();
        let owned_a = sub_mesh.read().material().unwrap();
        assert!(!same_material(&owned_a, &a));

        recorder.clear();
        sub_mesh.write().set_material(b.clone(), true).unwrap();

        let current = sub_mesh.read().material().unwrap();
        assert!(!same_material(&current, &b));
        assert!(sub_mesh.read().owns_material());
        assert_eq!(
            recorder.events(),
            vec![
                Event::Clone {
                    source: "b".into(),
                    clone: current.name().to_string(),
                },
                Event::Apply {
                    sub_mesh: "body".into(),
                    material: current.name().to_string(),
                },
                Event::Destroy(owned_a.name().to_string()),
            ]
        );
    }

    #[test]
    fn test_shared_assignment_destroys_only_owned_previous() {
        let recorder = Recorder::new();
        let services = recorder.services();
        let sub_mesh = test_sub_mesh(&recorder, &services, "body");
        let a = TestMaterial::create(&recorder, "a");
        let m = TestMaterial::create(&recorder, "m");

        sub_mesh.write().set_material(a, true).unwrap();
        let owned = sub_mesh.read().material().unwrap();

        sub_mesh.write().set_material(m.clone(), false).unwrap();

        assert_eq!(recorder.destroys(owned.name()), 1);
        assert_eq!(recorder.destroys("m"), 0);
        assert!(same_material(&sub_mesh.read().material().unwrap(), &m));
        assert!(!sub_mesh.read().owns_material());

        // Borrowed materials are never destroyed by the borrower
        let n = TestMaterial::create(&recorder, "n");
        sub_mesh.write().set_material(n, false).unwrap();
        assert_eq!(recorder.destroys("m"), 0);
    }

    #[test]
    fn test_foreign_material_is_rejected() {
        let recorder = Recorder::new();
        let services = recorder.services();
        let sub_mesh = test_sub_mesh(&recorder, &services, "body");
        let a = TestMaterial::create(&recorder, "a");
        let foreign = TestMaterial::create_for(&recorder, "foreign", BackendTag::new("other"));

        sub_mesh.write().set_material(a.clone(), false).unwrap();
        recorder.clear();

        let result = sub_mesh.write().set_material(foreign, true);

        assert!(matches!(result, Err(SceneError::BackendMismatch { .. })));
        assert!(recorder.events().is_empty());
        assert!(same_material(&sub_mesh.read().material().unwrap(), &a));
    }

    #[test]
    fn test_apply_failure_keeps_previous_and_releases_clone() {
        let recorder = Recorder::new();
        let services = recorder.services();
        let sub_mesh = test_sub_mesh(&recorder, &services, "body");
        let a = TestMaterial::create(&recorder, "a");
        let b = TestMaterial::create(&recorder, "b");

        sub_mesh.write().set_material(a, true).unwrap();
        let owned_a = sub_mesh.read().material().unwrap();

        sub_mesh.write().ops_mut().fail_apply = true;
        recorder.clear();
        let result = sub_mesh.write().set_material(b, true);

        assert!(matches!(result, Err(SceneError::Backend(_))));
        assert!(same_material(&sub_mesh.read().material().unwrap(), &owned_a));
        assert!(sub_mesh.read().owns_material());
        assert_eq!(recorder.destroys(owned_a.name()), 0);
        assert_eq!(recorder.clone_count(), 1);
        assert_eq!(recorder.destroy_count(), 1);
    }

    #[test]
    fn test_reapplying_same_instance_keeps_it_alive() {
        let recorder = Recorder::new();
        let services = recorder.services();
        let sub_mesh = test_sub_mesh(&recorder, &services, "body");
        let a = TestMaterial::create(&recorder, "a");

        sub_mesh.write().set_material(a, true).unwrap();
        let owned = sub_mesh.read().material().unwrap();

        sub_mesh.write().set_material(owned.clone(), false).unwrap();

        assert_eq!(recorder.destroy_count(), 0);
        assert!(sub_mesh.read().owns_material());

        sub_mesh.write().destroy();
        assert_eq!(recorder.destroys(owned.name()), 1);
    }

    #[test]
    fn test_unknown_material_name_is_ignored() {
        let recorder = Recorder::new();
        let services = recorder.services();
        let sub_mesh = test_sub_mesh(&recorder, &services, "body");
        recorder.register(TestMaterial::create(&recorder, "red"));

        sub_mesh.write().set_material_by_name("blue", true).unwrap();
        assert!(sub_mesh.read().material().is_none());

        sub_mesh.write().set_material_by_name("red", false).unwrap();
        assert_eq!(sub_mesh.read().material().unwrap().name(), "red");
    }

    #[test]
    fn test_pre_render_order() {
        let recorder = Recorder::new();
        let services = recorder.services();
        let sub_mesh = test_sub_mesh(&recorder, &services, "body");

        sub_mesh.write().pre_render();
        assert_eq!(recorder.events(), vec![Event::SubMeshPreRender("body".into())]);

        let a = TestMaterial::create(&recorder, "a");
        sub_mesh.write().set_material(a, false).unwrap();
        recorder.clear();

        sub_mesh.write().pre_render();
        assert_eq!(
            recorder.events(),
            vec![
                Event::SubMeshPreRender("body".into()),
                Event::MaterialPreRender("a".into()),
            ]
        );
    }

    #[test]
    fn test_destroy_is_idempotent() {
        let recorder = Recorder::new();
        let services = recorder.services();
        let sub_mesh = test_sub_mesh(&recorder, &services, "body");
        let a = TestMaterial::create(&recorder, "a");

        sub_mesh.write().set_material(a, true).unwrap();
        let owned = sub_mesh.read().material().unwrap();

        sub_mesh.write().destroy();
        sub_mesh.write().destroy();

        assert_eq!(recorder.destroys(owned.name()), 1);
        assert_eq!(recorder.teardowns("body"), 1);
        assert!(sub_mesh.read().material().is_none());
        assert!(sub_mesh.read().state().is_destroyed());
    }

    #[test]
    fn test_destroyed_sub_mesh_rejects_materials() {
        let recorder = Recorder::new();
        let services = recorder.services();
        let sub_mesh = test_sub_mesh(&recorder, &services, "body");
        sub_mesh.write().destroy();

        let a = TestMaterial::create(&recorder, "a");
        let result = sub_mesh.write().set_material(a, true);

        assert!(matches!(result, Err(SceneError::ObjectDestroyed(_))));
        assert_eq!(recorder.clone_count(), 0);
    }
}
