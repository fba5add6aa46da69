//! Scene description files.
//!
//! A description lists materials and meshes in RON, assigns materials by
//! name and says how many frames to prepare. [`SceneDescription::apply`]
//! drives the whole lifecycle against a [`HeadlessScene`].

use std::path::Path;

use glam::Vec4;
use lumen_scene::{Mesh, SceneError, SharedSubMesh, SubMesh};
use serde::{Deserialize, Serialize};

use crate::material::MaterialParams;
use crate::ops::{Geometry, HeadlessMesh};
use crate::scene::{HeadlessScene, ResourceStats};

/// Errors raised while loading or applying a description.
#[derive(Debug, thiserror::Error)]
pub enum DescriptionError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    Parse(#[from] ron::error::SpannedError),
    #[error("Serialization error: {0}")]
    Serialize(#[from] ron::Error),
    #[error("Scene error: {0}")]
    Scene(#[from] SceneError),
}

/// Built-in geometry of a submesh.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub enum Shape {
    #[default]
    Triangle,
    Quad {
        size: f32,
    },
    Cube {
        size: f32,
    },
}

impl Shape {
    pub fn geometry(&self) -> Geometry {
        match *self {
            Shape::Triangle => Geometry::triangle(),
            Shape::Quad { size } => Geometry::quad(size),
            Shape::Cube { size } => Geometry::cube(size),
        }
    }
}

/// A named material and its parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialDesc {
    pub name: String,
    #[serde(default)]
    pub params: MaterialParams,
}

/// A submesh with an optional material of its own.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubMeshDesc {
    pub name: String,
    #[serde(default)]
    pub shape: Shape,
    /// Material name assigned to this submesh before the mesh material
    #[serde(default)]
    pub material: Option<String>,
    /// Overrides the configured `unique_materials`
    #[serde(default)]
    pub unique: Option<bool>,
}

/// A mesh, its submeshes and an optional mesh-wide material.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeshDesc {
    pub name: String,
    #[serde(default)]
    pub sub_meshes: Vec<SubMeshDesc>,
    #[serde(default)]
    pub material: Option<String>,
    #[serde(default)]
    pub unique: Option<bool>,
}

/// Contents of a scene description file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneDescription {
    pub materials: Vec<MaterialDesc>,
    pub meshes: Vec<MeshDesc>,
    /// Number of frames to prepare before teardown
    pub frames: u32,
}

impl SceneDescription {
    /// Parses a description from RON text.
    pub fn from_ron(content: &str) -> Result<Self, DescriptionError> {
        Ok(ron::from_str(content)?)
    }

    /// Reads and parses the description at `path`.
    pub fn load(path: &Path) -> Result<Self, DescriptionError> {
        let content = std::fs::read_to_string(path)?;
        let description = Self::from_ron(&content)?;
        tracing::info!(
            "Loaded scene description from {:?} ({} materials, {} meshes)",
            path,
            description.materials.len(),
            description.meshes.len()
        );
        Ok(description)
    }

    /// Serializes the description as pretty RON.
    pub fn to_ron(&self) -> Result<String, DescriptionError> {
        Ok(ron::ser::to_string_pretty(
            self,
            ron::ser::PrettyConfig::default(),
        )?)
    }

    /// A small built-in scene: one multi-part mesh and one single-part sign.
    pub fn sample() -> Self {
        let mut glow = MaterialParams::colored(Vec4::new(0.1, 0.2, 0.9, 1.0)).with_pulse(0.5, 0.8);
        glow.emissive = Vec4::new(0.2, 0.4, 1.0, 1.0);

        Self {
            materials: vec![
                MaterialDesc {
                    name: "red".to_string(),
                    params: MaterialParams::colored(Vec4::new(0.9, 0.1, 0.1, 1.0)),
                },
                MaterialDesc {
                    name: "glow".to_string(),
                    params: glow,
                },
            ],
            meshes: vec![
                MeshDesc {
                    name: "car".to_string(),
                    sub_meshes: vec![
                        SubMeshDesc {
                            name: "body".to_string(),
                            shape: Shape::Cube { size: 2.0 },
                            material: None,
                            unique: None,
                        },
                        SubMeshDesc {
                            name: "door".to_string(),
                            shape: Shape::Quad { size: 1.0 },
                            material: Some("glow".to_string()),
                            unique: Some(true),
                        },
                        SubMeshDesc {
                            name: "wheel".to_string(),
                            shape: Shape::Triangle,
                            material: None,
                            unique: None,
                        },
                    ],
                    material: Some("red".to_string()),
                    unique: None,
                },
                MeshDesc {
                    name: "sign".to_string(),
                    sub_meshes: vec![SubMeshDesc {
                        name: "panel".to_string(),
                        shape: Shape::Quad { size: 0.5 },
                        material: None,
                        unique: None,
                    }],
                    material: Some("glow".to_string()),
                    unique: Some(false),
                },
            ],
            frames: 60,
        }
    }

    /// Builds the scene, prepares `frames` frames, tears every mesh down and
    /// returns the final material counters.
    ///
    /// Meshes built before an error are destroyed before it is returned.
    pub fn apply(&self, scene: &HeadlessScene) -> Result<ResourceStats, DescriptionError> {
        for material in &self.materials {
            scene.create_material(&material.name, material.params)?;
        }

        let default_unique = scene.config().unique_materials;
        let mut meshes: Vec<HeadlessMesh> = Vec::with_capacity(self.meshes.len());
        for desc in &self.meshes {
            match build_mesh(scene, desc, default_unique) {
                Ok(mesh) => meshes.push(mesh),
                Err(e) => {
                    tracing::error!("Failed to build mesh '{}': {}", desc.name, e);
                    for mesh in &mut meshes {
                        mesh.destroy();
                    }
                    return Err(e);
                }
            }
        }

        for _ in 0..self.frames {
            for mesh in &mut meshes {
                mesh.pre_render();
            }
        }

        for mesh in &mut meshes {
            tracing::info!(
                "Mesh '{}': {} submeshes, material {:?} (owned: {}), {} frames",
                mesh.name(),
                mesh.sub_mesh_count(),
                mesh.material().map(|m| m.name().to_string()),
                mesh.owns_material(),
                mesh.ops().frames()
            );
            mesh.destroy();
        }

        Ok(scene.stats())
    }
}

fn warn_if_unknown(scene: &HeadlessScene, name: &str) {
    if !scene.has_material(name) {
        tracing::warn!("Material '{}' is not defined in the scene", name);
    }
}

fn build_mesh(
    scene: &HeadlessScene,
    desc: &MeshDesc,
    default_unique: bool,
) -> Result<HeadlessMesh, DescriptionError> {
    let mut parts: Vec<SharedSubMesh> = Vec::with_capacity(desc.sub_meshes.len());
    let release = |parts: &[SharedSubMesh]| {
        for part in parts {
            part.write().destroy();
        }
    };

    for sub in &desc.sub_meshes {
        let part: SharedSubMesh = scene.create_sub_mesh(&sub.name, sub.shape.geometry());
        parts.push(part.clone());

        if let Some(material) = &sub.material {
            warn_if_unknown(scene, material);
            let unique = sub.unique.unwrap_or(default_unique);
            let result = part.write().set_material_by_name(material, unique);
            if let Err(e) = result {
                release(&parts);
                return Err(e.into());
            }
        }
    }

    let mut mesh = match scene.create_mesh(&desc.name, parts.iter().cloned()) {
        Ok(mesh) => mesh,
        Err(e) => {
            release(&parts);
            return Err(e.into());
        }
    };

    if let Some(material) = &desc.material {
        warn_if_unknown(scene, material);
        let unique = desc.unique.unwrap_or(default_unique);
        if let Err(e) = mesh.set_material_by_name(material, unique) {
            mesh.destroy();
            return Err(e.into());
        }
    }

    Ok(mesh)
}
