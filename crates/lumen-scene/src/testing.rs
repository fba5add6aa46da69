//! Recording fixtures for unit tests.

use std::any::Any;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::{Mutex, RwLock};
use uuid::Uuid;

use crate::backend::BackendTag;
use crate::error::{SceneError, SceneResult};
use crate::material::{Material, MaterialPtr};
use crate::mesh::{BaseMesh, MeshBackend};
use crate::services::{MaterialServices, SharedServices};
use crate::store::SubMeshList;
use crate::submesh::{BaseSubMesh, SubMeshBackend};

pub(crate) const TEST_BACKEND: BackendTag = BackendTag::new("test");

/// Observable side effect of a scene operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Event {
    Clone { source: String, clone: String },
    Apply { sub_mesh: String, material: String },
    Destroy(String),
    MaterialPreRender(String),
    SubMeshPreRender(String),
    MeshPreRender(String),
    SubMeshTeardown(String),
    MeshTeardown(String),
}

#[derive(Default)]
struct RecorderInner {
    events: Mutex<Vec<Event>>,
    destroyed: Mutex<HashSet<Uuid>>,
    registry: Mutex<HashMap<String, MaterialPtr>>,
    next_clone: AtomicU64,
}

/// Shared event log plus a material registry acting as the scene.
#[derive(Clone, Default)]
pub(crate) struct Recorder {
    inner: Arc<RecorderInner>,
}

impl Recorder {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn services(&self) -> SharedServices {
        Arc::new(TestServices {
            recorder: self.clone(),
        })
    }

    pub(crate) fn register(&self, material: MaterialPtr) {
        self.inner
            .registry
            .lock()
            .insert(material.name().to_string(), material);
    }

    fn push(&self, event: Event) {
        self.inner.events.lock().push(event);
    }

    pub(crate) fn events(&self) -> Vec<Event> {
        self.inner.events.lock().clone()
    }

    pub(crate) fn clear(&self) {
        self.inner.events.lock().clear();
    }

    fn count(&self, predicate: impl Fn(&Event) -> bool) -> usize {
        self.inner.events.lock().iter().filter(|e| predicate(*e)).count()
    }

    pub(crate) fn clone_count(&self) -> usize {
        self.count(|e| matches!(e, Event::Clone { .. }))
    }

    pub(crate) fn destroy_count(&self) -> usize {
        self.count(|e| matches!(e, Event::Destroy(_)))
    }

    pub(crate) fn destroys(&self, name: &str) -> usize {
        self.count(|e| matches!(e, Event::Destroy(n) if n == name))
    }

    pub(crate) fn teardowns(&self, name: &str) -> usize {
        self.count(|e| matches!(e, Event::SubMeshTeardown(n) if n == name))
    }

    pub(crate) fn mesh_teardowns(&self, name: &str) -> usize {
        self.count(|e| matches!(e, Event::MeshTeardown(n) if n == name))
    }

    fn is_destroyed(&self, id: Uuid) -> bool {
        self.inner.destroyed.lock().contains(&id)
    }
}

struct TestServices {
    recorder: Recorder,
}

impl MaterialServices for TestServices {
    fn material(&self, name: &str) -> Option<MaterialPtr> {
        self.recorder.inner.registry.lock().get(name).cloned()
    }

    fn destroy_material(&self, material: &MaterialPtr) {
        self.recorder.inner.destroyed.lock().insert(material.id());
        self.recorder.push(Event::Destroy(material.name().to_string()));
    }
}

pub(crate) struct TestMaterial {
    id: Uuid,
    name: String,
    backend: BackendTag,
    recorder: Recorder,
}

impl TestMaterial {
    pub(crate) fn create(recorder: &Recorder, name: &str) -> MaterialPtr {
        Self::create_for(recorder, name, TEST_BACKEND)
    }

    pub(crate) fn create_for(recorder: &Recorder, name: &str, backend: BackendTag) -> MaterialPtr {
        Arc::new(Self {
            id: Uuid::new_v4(),
            name: name.to_string(),
            backend,
            recorder: recorder.clone(),
        })
    }
}

impl Material for TestMaterial {
    fn id(&self) -> Uuid {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn backend(&self) -> BackendTag {
        self.backend
    }

    fn clone_material(&self) -> SceneResult<MaterialPtr> {
        if self.is_destroyed() {
            return Err(SceneError::MaterialDestroyed(self.name.clone()));
        }
        let n = self.recorder.inner.next_clone.fetch_add(1, Ordering::Relaxed);
        let clone = Self::create_for(&self.recorder, &format!("{}#{}", self.name, n), self.backend);
        self.recorder.push(Event::Clone {
            source: self.name.clone(),
            clone: clone.name().to_string(),
        });
        Ok(clone)
    }

    fn pre_render(&self) {
        self.recorder.push(Event::MaterialPreRender(self.name.clone()));
    }

    fn is_destroyed(&self) -> bool {
        self.recorder.is_destroyed(self.id)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

pub(crate) struct TestSubMeshOps {
    name: String,
    recorder: Recorder,
    pub(crate) fail_apply: bool,
}

impl SubMeshBackend for TestSubMeshOps {
    fn backend(&self) -> BackendTag {
        TEST_BACKEND
    }

    fn apply_material(&mut self, material: &MaterialPtr) -> SceneResult<()> {
        if self.fail_apply {
            return Err(SceneError::Backend(format!("cannot bind '{}'", material.name())));
        }
        self.recorder.push(Event::Apply {
            sub_mesh: self.name.clone(),
            material: material.name().to_string(),
        });
        Ok(())
    }

    fn pre_render(&mut self) {
        self.recorder.push(Event::SubMeshPreRender(self.name.clone()));
    }

    fn destroy(&mut self) {
        self.recorder.push(Event::SubMeshTeardown(self.name.clone()));
    }
}

pub(crate) struct TestMeshOps {
    name: String,
    recorder: Recorder,
}

impl MeshBackend for TestMeshOps {
    fn pre_render(&mut self) {
        self.recorder.push(Event::MeshPreRender(self.name.clone()));
    }

    fn destroy(&mut self) {
        self.recorder.push(Event::MeshTeardown(self.name.clone()));
    }
}

pub(crate) type TestSubMesh = Arc<RwLock<BaseSubMesh<TestSubMeshOps>>>;

pub(crate) fn test_sub_mesh(
    recorder: &Recorder,
    services: &SharedServices,
    name: &str,
) -> TestSubMesh {
    let ops = TestSubMeshOps {
        name: name.to_string(),
        recorder: recorder.clone(),
        fail_apply: false,
    };
    BaseSubMesh::new(name, services.clone(), ops).into_shared()
}

pub(crate) fn test_mesh(
    recorder: &Recorder,
    services: &SharedServices,
    name: &str,
    parts: &[&str],
) -> (BaseMesh<TestMeshOps>, Vec<TestSubMesh>) {
    let mut store = SubMeshList::new();
    let mut handles = Vec::new();
    for part in parts {
        let sub_mesh = test_sub_mesh(recorder, services, part);
        store
            .add(sub_mesh.clone())
            .expect("test submesh names are unique");
        handles.push(sub_mesh);
    }

    let ops = TestMeshOps {
        name: name.to_string(),
        recorder: recorder.clone(),
    };
    (
        BaseMesh::new(name, services.clone(), ops, Box::new(store)),
        handles,
    )
}
