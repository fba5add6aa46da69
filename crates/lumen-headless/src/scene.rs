//! Headless scene: material registry and object factory.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use lumen_scene::{
    Material, MaterialPtr, MaterialServices, SceneError, SceneResult, SharedServices,
    SharedSubMesh, SubMeshList,
};
use parking_lot::RwLock;
use serde::Serialize;

use crate::config::HeadlessConfig;
use crate::material::{Animation, HeadlessMaterial, MaterialParams, as_headless};
use crate::ops::{
    Geometry, HeadlessMesh, HeadlessMeshOps, HeadlessSubMesh, HeadlessSubMeshOps,
};

/// Material bookkeeping counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ResourceStats {
    /// Materials created by name.
    pub created: usize,
    /// Materials created by cloning.
    pub cloned: usize,
    /// Materials destroyed.
    pub destroyed: usize,
}

impl ResourceStats {
    /// Number of materials still alive.
    pub fn live(&self) -> usize {
        (self.created + self.cloned).saturating_sub(self.destroyed)
    }
}

pub(crate) struct SceneInner {
    config: HeadlessConfig,
    materials: RwLock<HashMap<String, Arc<HeadlessMaterial>>>,
    stats: RwLock<ResourceStats>,
    next_clone: AtomicU64,
}

impl SceneInner {
    fn animation(&self) -> Animation {
        Animation {
            enabled: self.config.animate_materials,
            frame_time: self.config.frame_time,
        }
    }

    /// Registers an independent copy of `source` under a fresh name.
    pub(crate) fn register_clone(this: &Arc<Self>, source: &HeadlessMaterial) -> MaterialPtr {
        let mut materials = this.materials.write();

        let name = loop {
            let n = this.next_clone.fetch_add(1, Ordering::Relaxed);
            let candidate = format!("{}_{}_{}", source.name(), this.config.clone_suffix, n);
            if !materials.contains_key(&candidate) {
                break candidate;
            }
        };

        let clone = Arc::new(HeadlessMaterial::new(
            name.clone(),
            source.params(),
            this.animation(),
            Arc::downgrade(this),
        ));
        materials.insert(name, clone.clone());
        this.stats.write().cloned += 1;

        tracing::debug!("Cloned material '{}' as '{}'", source.name(), clone.name());
        clone
    }

    /// Unregisters a destroyed material and counts it.
    fn release(&self, material: &HeadlessMaterial) {
        let mut materials = self.materials.write();
        if materials
            .get(material.name())
            .is_some_and(|m| m.id() == material.id())
        {
            materials.remove(material.name());
        }
        self.stats.write().destroyed += 1;
    }
}

/// In-memory scene for the headless backend.
///
/// Cloning the handle shares the same scene.
#[derive(Clone)]
pub struct HeadlessScene {
    inner: Arc<SceneInner>,
}

impl HeadlessScene {
    /// Creates an empty scene.
    pub fn new(config: HeadlessConfig) -> Self {
        Self {
            inner: Arc::new(SceneInner {
                config,
                materials: RwLock::new(HashMap::new()),
                stats: RwLock::new(ResourceStats::default()),
                next_clone: AtomicU64::new(0),
            }),
        }
    }

    /// Configuration the scene was created with.
    pub fn config(&self) -> &HeadlessConfig {
        &self.inner.config
    }

    /// Material services handle to inject into meshes and submeshes.
    pub fn services(&self) -> SharedServices {
        Arc::new(self.clone())
    }

    /// Creates and registers a material.
    pub fn create_material(
        &self,
        name: impl Into<String>,
        params: MaterialParams,
    ) -> SceneResult<MaterialPtr> {
        let name = name.into();
        let mut materials = self.inner.materials.write();
        if materials.contains_key(&name) {
            return Err(SceneError::DuplicateName(name));
        }

        let material = Arc::new(HeadlessMaterial::new(
            name.clone(),
            params,
            self.inner.animation(),
            Arc::downgrade(&self.inner),
        ));
        materials.insert(name.clone(), material.clone());
        self.inner.stats.write().created += 1;

        tracing::debug!("Created material '{}'", name);
        Ok(material)
    }

    /// Returns true if a live material is registered under `name`.
    pub fn has_material(&self, name: &str) -> bool {
        self.inner.materials.read().contains_key(name)
    }

    /// Names of all live materials, sorted.
    pub fn material_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.inner.materials.read().keys().cloned().collect();
        names.sort();
        names
    }

    /// Current material counters.
    pub fn stats(&self) -> ResourceStats {
        *self.inner.stats.read()
    }

    /// Creates a submesh over `geometry`, without a material.
    pub fn create_sub_mesh(
        &self,
        name: impl Into<String>,
        geometry: Geometry,
    ) -> Arc<RwLock<HeadlessSubMesh>> {
        HeadlessSubMesh::new(name, self.services(), HeadlessSubMeshOps::new(geometry)).into_shared()
    }

    /// Creates a mesh over the given submeshes, in order.
    pub fn create_mesh(
        &self,
        name: impl Into<String>,
        sub_meshes: impl IntoIterator<Item = SharedSubMesh>,
    ) -> SceneResult<HeadlessMesh> {
        let mut store = SubMeshList::new();
        for sub_mesh in sub_meshes {
            store.add(sub_mesh)?;
        }

        Ok(HeadlessMesh::new(
            name,
            self.services(),
            HeadlessMeshOps::default(),
            Box::new(store),
        ))
    }
}

impl Default for HeadlessScene {
    fn default() -> Self {
        Self::new(HeadlessConfig::default())
    }
}

impl MaterialServices for HeadlessScene {
    fn material(&self, name: &str) -> Option<MaterialPtr> {
        let material = self.inner.materials.read().get(name).cloned()?;
        Some(material)
    }

    fn destroy_material(&self, material: &MaterialPtr) {
        let Some(headless) = as_headless(material) else {
            tracing::warn!(
                "Ignoring destroy of material '{}' from the {} backend",
                material.name(),
                material.backend()
            );
            return;
        };

        if !headless.mark_destroyed() {
            tracing::warn!("Material '{}' was already destroyed", material.name());
            return;
        }

        // Bookkeeping belongs to the scene that registered the material
        match headless.scene() {
            Some(owner) if Arc::ptr_eq(&owner, &self.inner) => self.inner.release(headless),
            Some(owner) => {
                tracing::debug!(
                    "Material '{}' belongs to another scene, releasing it there",
                    material.name()
                );
                owner.release(headless);
            }
            None => {
                tracing::debug!("Scene of material '{}' no longer exists", material.name());
            }
        }

        tracing::debug!("Destroyed material '{}'", material.name());
    }
}
