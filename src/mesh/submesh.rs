use crate::math::{Isometry3, Point3};

slotmap::new_key_type! {
    /// Unique identifier for a submesh in a [`Scene`](super::Scene).
    pub struct SubmeshId;
}

/// A triangulated piece of the input model.
///
/// Positions are in the submesh's local space. `placement` maps local space
/// into the parent's space (or world space for a root submesh).
#[derive(Debug, Clone)]
pub struct Submesh {
    /// Display name, used only for diagnostics.
    pub name: String,
    /// Local-space vertex positions.
    pub positions: Vec<Point3>,
    /// Optional index buffer; three indices per triangle.
    pub indices: Option<Vec<u32>>,
    /// Generated overlay geometry (tabs, previews) excluded from topology.
    pub functional: bool,
    /// Local-to-parent rigid placement.
    pub placement: Isometry3,
    /// Parent submesh, if any.
    pub parent: Option<SubmeshId>,
}

impl Submesh {
    /// Creates an indexed, non-functional submesh with identity placement.
    #[must_use]
    pub fn indexed(name: impl Into<String>, positions: Vec<Point3>, indices: Vec<u32>) -> Self {
        Self {
            name: name.into(),
            positions,
            indices: Some(indices),
            functional: false,
            placement: Isometry3::identity(),
            parent: None,
        }
    }

    /// Creates a non-indexed submesh: every three positions form a triangle.
    #[must_use]
    pub fn triangle_soup(name: impl Into<String>, positions: Vec<Point3>) -> Self {
        Self {
            name: name.into(),
            positions,
            indices: None,
            functional: false,
            placement: Isometry3::identity(),
            parent: None,
        }
    }

    /// Marks this submesh as functional overlay geometry.
    #[must_use]
    pub fn functional(mut self) -> Self {
        self.functional = true;
        self
    }

    /// Sets the local-to-parent placement.
    #[must_use]
    pub fn with_placement(mut self, placement: Isometry3) -> Self {
        self.placement = placement;
        self
    }

    /// Sets the parent submesh.
    #[must_use]
    pub fn with_parent(mut self, parent: SubmeshId) -> Self {
        self.parent = Some(parent);
        self
    }

    /// Number of triangles this submesh declares.
    ///
    /// `index_count / 3` when indexed, otherwise `vertex_count / 3`.
    #[must_use]
    pub fn declared_triangles(&self) -> usize {
        match &self.indices {
            Some(indices) => indices.len() / 3,
            None => self.positions.len() / 3,
        }
    }

    /// Iterates `(local_index, vertex_indices)` for each triangle.
    ///
    /// Triangles referencing a position outside the buffer are skipped, as is
    /// a trailing partial triangle.
    pub fn triangles(&self) -> impl Iterator<Item = (usize, [usize; 3])> + '_ {
        let count = self.declared_triangles();
        let len = self.positions.len();
        (0..count).filter_map(move |t| {
            let tri = match &self.indices {
                Some(indices) => [
                    indices[3 * t] as usize,
                    indices[3 * t + 1] as usize,
                    indices[3 * t + 2] as usize,
                ],
                None => [3 * t, 3 * t + 1, 3 * t + 2],
            };
            tri.iter().all(|&i| i < len).then_some((t, tri))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(x: f64, y: f64, z: f64) -> Point3 {
        Point3::new(x, y, z)
    }

    #[test]
    fn soup_counts_vertex_triples() {
        let mesh = Submesh::triangle_soup(
            "soup",
            vec![
                p(0.0, 0.0, 0.0),
                p(1.0, 0.0, 0.0),
                p(0.0, 1.0, 0.0),
                p(5.0, 5.0, 5.0),
            ],
        );
        assert_eq!(mesh.declared_triangles(), 1);
        assert_eq!(mesh.triangles().collect::<Vec<_>>(), vec![(0, [0, 1, 2])]);
    }

    #[test]
    fn out_of_range_indices_are_skipped() {
        let mesh = Submesh::indexed(
            "bad",
            vec![p(0.0, 0.0, 0.0), p(1.0, 0.0, 0.0), p(0.0, 1.0, 0.0)],
            vec![0, 1, 2, 0, 1, 7],
        );
        assert_eq!(mesh.declared_triangles(), 2);
        assert_eq!(mesh.triangles().map(|(t, _)| t).collect::<Vec<_>>(), vec![0]);
    }
}
