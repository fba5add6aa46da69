//! Mesh: an ordered composite of submeshes.
//!
//! The mesh has no material of its own. Its effective material is the one on
//! submesh 0, and assigning a material fans out to every submesh. The mesh
//! keeps a record of the last assigned material only to know whether it has
//! to destroy it.

use uuid::Uuid;

use crate::backend::ObjectState;
use crate::error::{SceneError, SceneResult};
use crate::material::{MaterialPtr, same_material};
use crate::services::SharedServices;
use crate::store::{SharedSubMesh, SubMeshStore};

/// Backend-neutral mesh interface.
pub trait Mesh: Send + Sync {
    /// Unique identifier of this mesh.
    fn id(&self) -> Uuid;

    /// Name of this mesh.
    fn name(&self) -> &str;

    /// Current lifecycle state.
    fn state(&self) -> ObjectState;

    /// Returns the number of submeshes.
    fn sub_mesh_count(&self) -> usize;

    /// Returns true if this exact submesh belongs to the mesh.
    fn has_sub_mesh(&self, sub_mesh: &SharedSubMesh) -> bool;

    /// Returns true if a submesh with the given name belongs to the mesh.
    fn has_sub_mesh_name(&self, name: &str) -> bool;

    /// Gets a submesh by name.
    fn sub_mesh_by_name(&self, name: &str) -> Option<SharedSubMesh>;

    /// Gets a submesh by index.
    fn sub_mesh_by_index(&self, index: usize) -> Option<SharedSubMesh>;

    /// Material of the first submesh, or `None` for an empty mesh.
    fn material(&self) -> Option<MaterialPtr>;

    /// Returns true if the mesh must destroy its assigned material.
    fn owns_material(&self) -> bool;

    /// Applies a material to every submesh.
    ///
    /// With `unique` set and at least one submesh, the material is cloned
    /// once and all submeshes share the clone, which the mesh owns.
    fn set_material(&mut self, material: MaterialPtr, unique: bool) -> SceneResult<()>;

    /// Applies the scene material registered under `name`.
    ///
    /// Unknown names are ignored.
    fn set_material_by_name(&mut self, name: &str, unique: bool) -> SceneResult<()>;

    /// Per-frame preparation of every submesh, then of the mesh itself.
    fn pre_render(&mut self);

    /// Tears the mesh and all of its submeshes down. Repeated calls do nothing.
    fn destroy(&mut self);
}

/// Backend hooks for a mesh.
pub trait MeshBackend: Send + Sync {
    /// Backend frame preparation, after all submeshes were prepared.
    fn pre_render(&mut self) {}

    /// Releases backend resources, before the submeshes are destroyed.
    fn destroy(&mut self) {}
}

/// Mesh implementation shared by all backends.
pub struct BaseMesh<B: MeshBackend> {
    id: Uuid,
    name: String,
    services: SharedServices,
    ops: B,
    sub_meshes: Box<dyn SubMeshStore>,
    material: Option<MaterialPtr>,
    owns_material: bool,
    /// Previously owned materials some submesh still references.
    retired: Vec<MaterialPtr>,
    state: ObjectState,
}

impl<B: MeshBackend> BaseMesh<B> {
    /// Creates a mesh over a populated submesh store.
    pub fn new(
        name: impl Into<String>,
        services: SharedServices,
        ops: B,
        sub_meshes: Box<dyn SubMeshStore>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            services,
            ops,
            sub_meshes,
            material: None,
            owns_material: false,
            retired: Vec::new(),
            state: ObjectState::Active,
        }
    }

    /// Last material assigned through the mesh, if any.
    pub fn assigned_material(&self) -> Option<MaterialPtr> {
        self.material.clone()
    }

    /// Backend hooks of this mesh.
    pub fn ops(&self) -> &B {
        &self.ops
    }

    /// Mutable access to the backend hooks.
    pub fn ops_mut(&mut self) -> &mut B {
        &mut self.ops
    }

    fn sub_mesh_list(&self) -> Vec<SharedSubMesh> {
        (0..self.sub_meshes.size())
            .filter_map(|i| self.sub_meshes.get_by_index(i))
            .collect()
    }

    fn is_referenced(&self, material: &MaterialPtr) -> bool {
        for sub_mesh in self.sub_mesh_list() {
            let current = sub_mesh.read().material();
            if current.is_some_and(|m| same_material(&m, material)) {
                return true;
            }
        }
        false
    }

    /// Destroys retired materials that no submesh references any more.
    fn release_retired(&mut self) {
        if self.retired.is_empty() {
            return;
        }

        let mut still_used = Vec::new();
        for material in std::mem::take(&mut self.retired) {
            if self.is_referenced(&material) {
                still_used.push(material);
            } else {
                self.services.destroy_material(&material);
            }
        }
        self.retired = still_used;
    }
}

impl<B: MeshBackend> Mesh for BaseMesh<B> {
    fn id(&self) -> Uuid {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn state(&self) -> ObjectState {
        self.state
    }

    fn sub_mesh_count(&self) -> usize {
        self.sub_meshes.size()
    }

    fn has_sub_mesh(&self, sub_mesh: &SharedSubMesh) -> bool {
        self.sub_meshes.contains(sub_mesh)
    }

    fn has_sub_mesh_name(&self, name: &str) -> bool {
        self.sub_meshes.contains_name(name)
    }

    fn sub_mesh_by_name(&self, name: &str) -> Option<SharedSubMesh> {
        self.sub_meshes.get_by_name(name)
    }

    fn sub_mesh_by_index(&self, index: usize) -> Option<SharedSubMesh> {
        self.sub_meshes.get_by_index(index)
    }

    fn material(&self) -> Option<MaterialPtr> {
        let first = self.sub_meshes.get_by_index(0)?;
        first.read().material()
    }

    fn owns_material(&self) -> bool {
        self.owns_material
    }

    fn set_material(&mut self, material: MaterialPtr, unique: bool) -> SceneResult<()> {
        if self.state.is_destroyed() {
            return Err(SceneError::ObjectDestroyed(self.name.clone()));
        }

        let sub_meshes = self.sub_mesh_list();

        // Nothing is cloned or applied unless every submesh accepts the material
        for sub_mesh in &sub_meshes {
            let checked = sub_mesh.read().check_material(&material);
            if let Err(err) = checked {
                tracing::error!("Mesh '{}' rejected material: {}", self.name, err);
                return Err(err);
            }
        }

        let cloned = unique && !sub_meshes.is_empty();
        let material = if cloned {
            material.clone_material()?
        } else {
            material
        };

        let mut applied = 0;
        let mut failure = None;
        for sub_mesh in &sub_meshes {
            let result = sub_mesh.write().set_material(material.clone(), false);
            match result {
                Ok(()) => applied += 1,
                Err(err) => {
                    failure = Some(err);
                    break;
                }
            }
        }

        if applied == 0
            && let Some(err) = failure.take()
        {
            if cloned {
                self.services.destroy_material(&material);
            }
            return Err(err);
        }

        let keeps_current = self
            .material
            .as_ref()
            .is_some_and(|current| same_material(current, &material));
        if !keeps_current {
            if let Some(previous) = self.material.take()
                && self.owns_material
            {
                self.retired.push(previous);
            }
            tracing::debug!(
                "Mesh '{}' now uses material '{}' on {} submeshes (owned: {})",
                self.name,
                material.name(),
                applied,
                cloned
            );
            self.material = Some(material);
            self.owns_material = cloned;
        }
        self.release_retired();

        match failure {
            Some(err) => {
                tracing::error!(
                    "Mesh '{}' material assignment stopped after {} of {} submeshes: {}",
                    self.name,
                    applied,
                    sub_meshes.len(),
                    err
                );
                Err(err)
            }
            None => Ok(()),
        }
    }

    fn set_material_by_name(&mut self, name: &str, unique: bool) -> SceneResult<()> {
        match self.services.material(name) {
            Some(material) => self.set_material(material, unique),
            None => {
                tracing::debug!("Material '{}' not found, mesh '{}' unchanged", name, self.name);
                Ok(())
            }
        }
    }

    fn pre_render(&mut self) {
        if self.state.is_destroyed() {
            return;
        }

        for sub_mesh in self.sub_mesh_list() {
            sub_mesh.write().pre_render();
        }
        self.ops.pre_render();
    }

    fn destroy(&mut self) {
        if self.state.is_destroyed() {
            return;
        }

        self.ops.destroy();
        self.sub_meshes.destroy_all();
        for material in self.retired.drain(..) {
            self.services.destroy_material(&material);
        }
        if let Some(material) = self.material.take()
            && self.owns_material
        {
            self.services.destroy_material(&material);
        }
        self.owns_material = false;
        self.state = ObjectState::Destroyed;
        tracing::debug!("Destroyed mesh '{}'", self.name);
    }
}
