//! Headless materials.
//!
//! Parameters live on the CPU and are packed into a uniform block the same
//! way a GPU backend would upload them.

use std::any::Any;
use std::sync::{Arc, Weak};
use std::sync::atomic::{AtomicBool, Ordering};

use bytemuck::{Pod, Zeroable};
use glam::Vec4;
use lumen_scene::{BackendTag, Material, MaterialPtr, SceneError, SceneResult};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::scene::SceneInner;

/// Backend tag carried by every headless resource.
pub const HEADLESS: BackendTag = BackendTag::new("headless");

/// Emissive pulse driven by the material clock.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pulse {
    /// Oscillations per second.
    pub frequency: f32,
    /// Peak change of the emissive intensity.
    pub amplitude: f32,
}

/// Surface parameters of a material.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MaterialParams {
    /// Diffuse color (RGBA)
    pub diffuse: Vec4,
    /// Specular color (RGBA)
    pub specular: Vec4,
    /// Emissive color (RGBA)
    pub emissive: Vec4,
    /// Specular exponent
    pub shininess: f32,
    /// Optional emissive animation
    pub pulse: Option<Pulse>,
}

impl Default for MaterialParams {
    fn default() -> Self {
        Self {
            diffuse: Vec4::new(0.7, 0.7, 0.7, 1.0),
            specular: Vec4::new(0.2, 0.2, 0.2, 1.0),
            emissive: Vec4::ZERO,
            shininess: 32.0,
            pulse: None,
        }
    }
}

impl MaterialParams {
    /// Plain material with the given diffuse color.
    pub fn colored(diffuse: Vec4) -> Self {
        Self {
            diffuse,
            ..Default::default()
        }
    }

    /// Sets the emissive pulse.
    pub fn with_pulse(mut self, frequency: f32, amplitude: f32) -> Self {
        self.pulse = Some(Pulse {
            frequency,
            amplitude,
        });
        self
    }

    /// Packs the parameters at material time `time` (seconds).
    pub fn pack(&self, time: f32) -> MaterialUniform {
        let emissive = match self.pulse {
            Some(pulse) => {
                let wave = (time * pulse.frequency * std::f32::consts::TAU).sin();
                let scale = (1.0 + wave * pulse.amplitude).max(0.0);
                (self.emissive.truncate() * scale).extend(self.emissive.w)
            }
            None => self.emissive,
        };

        MaterialUniform {
            diffuse: self.diffuse.to_array(),
            specular: self.specular.to_array(),
            emissive: emissive.to_array(),
            shininess: self.shininess,
            time,
            _padding: [0.0; 2],
        }
    }
}

/// Uniform block layout of a material.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct MaterialUniform {
    pub diffuse: [f32; 4],
    pub specular: [f32; 4],
    pub emissive: [f32; 4],
    pub shininess: f32,
    pub time: f32,
    pub _padding: [f32; 2],
}

/// Per-frame clock settings copied from the scene config.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Animation {
    pub enabled: bool,
    pub frame_time: f32,
}

#[derive(Debug)]
struct FrameState {
    time: f32,
    frames: u64,
    uniform: MaterialUniform,
}

/// A material owned by a [`crate::HeadlessScene`].
pub struct HeadlessMaterial {
    id: Uuid,
    name: String,
    params: RwLock<MaterialParams>,
    frame: RwLock<FrameState>,
    animation: Animation,
    destroyed: AtomicBool,
    scene: Weak<SceneInner>,
}

impl HeadlessMaterial {
    pub(crate) fn new(
        name: String,
        params: MaterialParams,
        animation: Animation,
        scene: Weak<SceneInner>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            params: RwLock::new(params),
            frame: RwLock::new(FrameState {
                time: 0.0,
                frames: 0,
                uniform: params.pack(0.0),
            }),
            animation,
            destroyed: AtomicBool::new(false),
            scene,
        }
    }

    /// Current parameters.
    pub fn params(&self) -> MaterialParams {
        *self.params.read()
    }

    /// Replaces the parameters and repacks the uniform block.
    pub fn set_params(&self, params: MaterialParams) {
        *self.params.write() = params;
        let mut frame = self.frame.write();
        frame.uniform = params.pack(frame.time);
    }

    /// Uniform block as of the last frame.
    pub fn uniform(&self) -> MaterialUniform {
        self.frame.read().uniform
    }

    /// Number of frames this material was prepared for.
    pub fn frames(&self) -> u64 {
        self.frame.read().frames
    }

    /// Material clock in seconds.
    pub fn time(&self) -> f32 {
        self.frame.read().time
    }

    pub(crate) fn scene(&self) -> Option<Arc<SceneInner>> {
        self.scene.upgrade()
    }

    pub(crate) fn mark_destroyed(&self) -> bool {
        !self.destroyed.swap(true, Ordering::AcqRel)
    }
}

impl Material for HeadlessMaterial {
    fn id(&self) -> Uuid {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn backend(&self) -> BackendTag {
        HEADLESS
    }

    fn clone_material(&self) -> SceneResult<MaterialPtr> {
        if self.is_destroyed() {
            return Err(SceneError::MaterialDestroyed(self.name.clone()));
        }
        let scene = self.scene.upgrade().ok_or_else(|| {
            SceneError::Backend(format!("scene of material '{}' no longer exists", self.name))
        })?;
        Ok(SceneInner::register_clone(&scene, self))
    }

    fn pre_render(&self) {
        if self.is_destroyed() {
            return;
        }

        let params = self.params();
        let mut frame = self.frame.write();
        frame.frames += 1;
        if self.animation.enabled {
            frame.time += self.animation.frame_time;
        }
        frame.uniform = params.pack(frame.time);
    }

    fn is_destroyed(&self) -> bool {
        self.destroyed.load(Ordering::Acquire)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Returns the headless material behind `material`, if it is one.
pub fn as_headless(material: &MaterialPtr) -> Option<&HeadlessMaterial> {
    material.as_any().downcast_ref::<HeadlessMaterial>()
}
