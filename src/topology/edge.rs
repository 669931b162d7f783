use std::fmt;

use serde::{Deserialize, Serialize};

use super::face::FaceId;
use super::vertex::VertexKey;

/// Sequential identifier of an edge in a [`TopologyIndex`](super::TopologyIndex).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EdgeId(pub u32);

impl EdgeId {
    /// Position of the edge in the edge table.
    #[must_use]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for EdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unordered vertex pair identifying an edge, stored sorted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EdgeKey(VertexKey, VertexKey);

impl EdgeKey {
    /// Creates the canonical key for the pair `(a, b)`.
    #[must_use]
    pub fn new(a: VertexKey, b: VertexKey) -> Self {
        if a <= b {
            Self(a, b)
        } else {
            Self(b, a)
        }
    }

    /// The smaller endpoint.
    #[must_use]
    pub fn first(&self) -> VertexKey {
        self.0
    }

    /// The larger endpoint.
    #[must_use]
    pub fn second(&self) -> VertexKey {
        self.1
    }
}

/// Classification of an edge by the number of incident faces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeKind {
    /// One incident face: open boundary.
    Boundary,
    /// Two incident faces.
    Manifold,
    /// Three or more incident faces.
    NonManifold,
}

/// An edge of the welded mesh together with its incident faces.
#[derive(Debug, Clone)]
pub struct Edge {
    /// Edge identifier.
    pub id: EdgeId,
    /// Sorted endpoint keys.
    pub key: EdgeKey,
    /// Incident faces, in order of first incidence.
    pub faces: Vec<FaceId>,
}

impl Edge {
    /// Classifies the edge by incident-face count.
    #[must_use]
    pub fn kind(&self) -> EdgeKind {
        match self.faces.len() {
            0 | 1 => EdgeKind::Boundary,
            2 => EdgeKind::Manifold,
            _ => EdgeKind::NonManifold,
        }
    }
}
