//! Submesh storage.
//!
//! A mesh never owns its submeshes directly; it delegates enumeration and
//! lookup to a store that the backend populates before the mesh is used.

use std::sync::Arc;

use parking_lot::RwLock;

use crate::error::{SceneError, SceneResult};
use crate::submesh::SubMesh;

/// Shared, lockable handle to a submesh of any backend.
pub type SharedSubMesh = Arc<RwLock<dyn SubMesh>>;

/// Collection of submeshes backing a mesh.
///
/// Lookups return `None` for unknown names and out-of-range indices.
pub trait SubMeshStore: Send + Sync {
    /// Returns the number of stored submeshes.
    fn size(&self) -> usize;

    /// Returns true if this exact submesh instance is stored.
    fn contains(&self, sub_mesh: &SharedSubMesh) -> bool;

    /// Returns true if a submesh with the given name is stored.
    fn contains_name(&self, name: &str) -> bool;

    /// Gets a submesh by name. The empty name matches nothing.
    fn get_by_name(&self, name: &str) -> Option<SharedSubMesh>;

    /// Gets a submesh by insertion index.
    fn get_by_index(&self, index: usize) -> Option<SharedSubMesh>;

    /// Destroys every stored submesh and empties the store.
    ///
    /// Calling it again on an empty store does nothing.
    fn destroy_all(&mut self);
}

/// Ordered submesh store.
///
/// Insertion order is enumeration order. Entries are unique by identity and,
/// when named, by name.
#[derive(Default)]
pub struct SubMeshList {
    sub_meshes: Vec<SharedSubMesh>,
}

impl SubMeshList {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a submesh.
    ///
    /// Fails if the same instance, or another submesh with the same
    /// non-empty name, is already stored.
    pub fn add(&mut self, sub_mesh: SharedSubMesh) -> SceneResult<()> {
        let name = sub_mesh.read().name().to_string();

        if self.contains(&sub_mesh) || (!name.is_empty() && self.contains_name(&name)) {
            return Err(SceneError::DuplicateName(name));
        }

        self.sub_meshes.push(sub_mesh);
        Ok(())
    }

    /// Returns an iterator over the stored submeshes in order.
    pub fn iter(&self) -> impl Iterator<Item = &SharedSubMesh> {
        self.sub_meshes.iter()
    }

    /// Returns the number of stored submeshes.
    pub fn len(&self) -> usize {
        self.sub_meshes.len()
    }

    /// Returns true if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.sub_meshes.is_empty()
    }
}

impl SubMeshStore for SubMeshList {
    fn size(&self) -> usize {
        self.sub_meshes.len()
    }

    fn contains(&self, sub_mesh: &SharedSubMesh) -> bool {
        self.sub_meshes.iter().any(|s| Arc::ptr_eq(s, sub_mesh))
    }

    fn contains_name(&self, name: &str) -> bool {
        self.get_by_name(name).is_some()
    }

    fn get_by_name(&self, name: &str) -> Option<SharedSubMesh> {
        // Unnamed submeshes are only reachable by index
        if name.is_empty() {
            return None;
        }
        self.sub_meshes
            .iter()
            .find(|s| s.read().name() == name)
            .cloned()
    }

    fn get_by_index(&self, index: usize) -> Option<SharedSubMesh> {
        self.sub_meshes.get(index).cloned()
    }

    fn destroy_all(&mut self) {
        for sub_mesh in self.sub_meshes.drain(..) {
            sub_mesh.write().destroy();
        }
    }
}
