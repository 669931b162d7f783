use crate::math::Point3;
use crate::mesh::SubmeshId;

/// Exact-coordinate identity used to weld vertices.
///
/// Two corners weld when their local coordinates are bit-identical, whatever
/// submesh they come from. No tolerance is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VertexKey {
    bits: [u64; 3],
}

impl VertexKey {
    /// Creates the key of a local-space position.
    #[must_use]
    pub fn new(local: &Point3) -> Self {
        Self {
            bits: [local.x.to_bits(), local.y.to_bits(), local.z.to_bits()],
        }
    }

    /// The exact local-space position the key was derived from.
    #[must_use]
    pub fn local_position(&self) -> Point3 {
        Point3::new(
            f64::from_bits(self.bits[0]),
            f64::from_bits(self.bits[1]),
            f64::from_bits(self.bits[2]),
        )
    }
}

/// A welded vertex: the submesh that registered it first, whose placement
/// decides its world position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct WeldedVertex {
    pub(crate) owner: SubmeshId,
    pub(crate) position: Point3,
}
