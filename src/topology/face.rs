use std::fmt;

use serde::{Deserialize, Serialize};

use crate::mesh::SubmeshId;

use super::vertex::VertexKey;

/// Globally unique identifier of a mesh triangle.
///
/// Assigned sequentially at topology build time and never reassigned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FaceId(pub u32);

impl FaceId {
    /// Position of the face in per-face tables.
    #[must_use]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for FaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The source triangle of a face.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FaceSource {
    /// Submesh the triangle was read from.
    pub submesh: SubmeshId,
    /// Triangle index inside that submesh.
    pub local_index: usize,
}

/// Per-face data stored by the index.
#[derive(Debug, Clone)]
pub(crate) struct FaceRecord {
    pub(crate) source: FaceSource,
    pub(crate) corners: [VertexKey; 3],
}
