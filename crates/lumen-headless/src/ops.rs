//! Backend hooks for headless meshes and submeshes.

use glam::Vec3;
use lumen_scene::{
    BackendTag, BaseMesh, BaseSubMesh, Material, MaterialPtr, MeshBackend, SceneError,
    SceneResult, SubMeshBackend,
};
use uuid::Uuid;

use crate::material::{HEADLESS, as_headless};

/// Mesh type produced by [`crate::HeadlessScene`].
pub type HeadlessMesh = BaseMesh<HeadlessMeshOps>;

/// Submesh type produced by [`crate::HeadlessScene`].
pub type HeadlessSubMesh = BaseSubMesh<HeadlessSubMeshOps>;

/// Indexed triangle geometry kept in CPU memory.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Geometry {
    /// Vertex positions.
    pub positions: Vec<Vec3>,
    /// Triangle indices (3 per triangle).
    pub indices: Vec<u32>,
}

impl Geometry {
    /// Creates geometry from positions and indices.
    pub fn new(positions: Vec<Vec3>, indices: Vec<u32>) -> Self {
        Self { positions, indices }
    }

    /// A single triangle in the XY plane.
    pub fn triangle() -> Self {
        Self::new(
            vec![Vec3::ZERO, Vec3::X, Vec3::Y],
            vec![0, 1, 2],
        )
    }

    /// A square of side `size` in the XY plane, centered at the origin.
    pub fn quad(size: f32) -> Self {
        let h = size / 2.0;
        Self::new(
            vec![
                Vec3::new(-h, -h, 0.0),
                Vec3::new(h, -h, 0.0),
                Vec3::new(h, h, 0.0),
                Vec3::new(-h, h, 0.0),
            ],
            vec![0, 1, 2, 0, 2, 3],
        )
    }

    /// An axis-aligned cube of side `size`, centered at the origin.
    pub fn cube(size: f32) -> Self {
        let h = size / 2.0;
        let positions = (0..8)
            .map(|i| {
                Vec3::new(
                    if i & 1 == 0 { -h } else { h },
                    if i & 2 == 0 { -h } else { h },
                    if i & 4 == 0 { -h } else { h },
                )
            })
            .collect();
        #[rustfmt::skip]
        let indices = vec![
            0, 2, 1, 1, 2, 3, // -z
            4, 5, 6, 5, 7, 6, // +z
            0, 1, 4, 1, 5, 4, // -y
            2, 6, 3, 3, 6, 7, // +y
            0, 4, 2, 2, 4, 6, // -x
            1, 3, 5, 3, 7, 5, // +x
        ];
        Self::new(positions, indices)
    }

    /// Number of triangles.
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Axis-aligned bounds, or `None` for empty geometry.
    pub fn bounds(&self) -> Option<(Vec3, Vec3)> {
        let first = *self.positions.first()?;
        Some(
            self.positions
                .iter()
                .fold((first, first), |(min, max), p| (min.min(*p), max.max(*p))),
        )
    }
}

/// Headless submesh hooks: geometry plus the bound material's uniform data.
#[derive(Debug, Default)]
pub struct HeadlessSubMeshOps {
    geometry: Geometry,
    bound_material: Option<Uuid>,
    uniform: Vec<u8>,
    frames: u64,
    released: bool,
}

impl HeadlessSubMeshOps {
    /// Creates hooks over `geometry`.
    pub fn new(geometry: Geometry) -> Self {
        Self {
            geometry,
            ..Default::default()
        }
    }

    /// Geometry buffers (empty after teardown).
    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    /// Identifier of the material bound to the geometry.
    pub fn bound_material(&self) -> Option<Uuid> {
        self.bound_material
    }

    /// Uniform bytes uploaded when the material was bound.
    pub fn uniform_bytes(&self) -> &[u8] {
        &self.uniform
    }

    /// Number of prepared frames.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Returns true once the geometry buffers were released.
    pub fn is_released(&self) -> bool {
        self.released
    }
}

impl SubMeshBackend for HeadlessSubMeshOps {
    fn backend(&self) -> BackendTag {
        HEADLESS
    }

    fn apply_material(&mut self, material: &MaterialPtr) -> SceneResult<()> {
        if self.released {
            return Err(SceneError::Backend("geometry buffers were released".into()));
        }

        let headless = as_headless(material).ok_or_else(|| {
            SceneError::Backend(format!("'{}' is not a headless material", material.name()))
        })?;

        let uniform = headless.uniform();
        self.uniform = bytemuck::bytes_of(&uniform).to_vec();
        self.bound_material = Some(material.id());
        Ok(())
    }

    fn pre_render(&mut self) {
        self.frames += 1;
    }

    fn destroy(&mut self) {
        self.geometry = Geometry::default();
        self.bound_material = None;
        self.uniform.clear();
        self.released = true;
    }
}

/// Headless mesh hooks.
#[derive(Debug, Default)]
pub struct HeadlessMeshOps {
    frames: u64,
    released: bool,
}

impl HeadlessMeshOps {
    /// Number of prepared frames.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Returns true once the mesh was torn down.
    pub fn is_released(&self) -> bool {
        self.released
    }
}

impl MeshBackend for HeadlessMeshOps {
    fn pre_render(&mut self) {
        self.frames += 1;
    }

    fn destroy(&mut self) {
        self.released = true;
    }
}
