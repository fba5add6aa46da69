//! Backend identification and object lifecycle state.

use std::fmt;

/// Identifies the rendering backend that created a resource.
///
/// Every material carries the tag of its backend so a submesh can refuse
/// materials that another backend produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BackendTag(&'static str);

impl BackendTag {
    /// Creates a tag from a static backend name.
    pub const fn new(name: &'static str) -> Self {
        Self(name)
    }

    /// Returns the backend name.
    pub fn name(&self) -> &'static str {
        self.0
    }
}

impl fmt::Display for BackendTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

/// Lifecycle state of a mesh or submesh.
///
/// Objects are built by a backend factory with their submesh store already
/// populated, so they start out `Active`. `Destroyed` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ObjectState {
    #[default]
    Active,
    Destroyed,
}

impl ObjectState {
    /// Returns true once the object has been torn down.
    pub fn is_destroyed(&self) -> bool {
        matches!(self, ObjectState::Destroyed)
    }
}
