//! Lumen Scene Core
//!
//! Renderer-agnostic bookkeeping for meshes, submeshes and their materials.
//!
//! # Architecture
//!
//! The core is split into capability traits and backend hooks:
//!
//! - [`mesh::Mesh`] / [`submesh::SubMesh`] - Backend-neutral object interfaces
//! - [`mesh::MeshBackend`] / [`submesh::SubMeshBackend`] - Backend-specific hooks
//! - [`mesh::BaseMesh`] / [`submesh::BaseSubMesh`] - Shared ownership logic,
//!   generic over the backend hooks
//! - [`material::Material`] - Material capability (clone, per-frame update)
//! - [`services::MaterialServices`] - Scene-side material registry and destroy call
//! - [`store::SubMeshStore`] - Ordered submesh collection owned by a mesh
//!
//! # Ownership
//!
//! A material is referenced by at most one owner and any number of borrowers.
//! Only the owner asks the scene to destroy it. Passing `unique = true` to
//! `set_material` clones the material so the receiver becomes its owner.
//!
//! # Example
//!
//! ```ignore
//! use lumen_scene::{Mesh, SubMesh};
//!
//! let mut mesh = scene.create_mesh("robot", sub_meshes)?;
//!
//! // Every submesh receives the same fresh clone of "red"; the mesh owns it.
//! mesh.set_material_by_name("red", true)?;
//!
//! mesh.pre_render();
//! mesh.destroy();
//! ```

pub mod backend;
pub mod error;
pub mod material;
pub mod mesh;
pub mod services;
pub mod store;
pub mod submesh;

#[cfg(test)]
pub(crate) mod testing;

// Re-exports for convenience
pub use backend::{BackendTag, ObjectState};
pub use error::{SceneError, SceneResult};
pub use material::{Material, MaterialPtr, ensure_backend, same_material};
pub use mesh::{BaseMesh, Mesh, MeshBackend};
pub use services::{MaterialServices, SharedServices};
pub use store::{SharedSubMesh, SubMeshList, SubMeshStore};
pub use submesh::{BaseSubMesh, SubMesh, SubMeshBackend};
