use std::collections::HashMap;
use std::rc::Rc;

use crate::math::rotation::signed_angle;
use crate::math::{Point3, TOLERANCE};
use crate::topology::{EdgeId, TopologyIndex};

/// Geometry of an edge with exactly two incident faces.
///
/// `start -> end` runs the way the edge is traversed by the winding of the
/// `first` face, so the sign of [`signed_dihedral`] is a property of the
/// surface rather than of the edge's storage order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hinge {
    /// Edge start, in the first face's winding.
    pub start: Point3,
    /// Edge end, in the first face's winding.
    pub end: Point3,
    /// Corners of the first incident face, in source winding.
    pub first: [Point3; 3],
    /// Corners of the second incident face, in source winding.
    pub second: [Point3; 3],
}

/// Supplies hinge geometry to a [`DihedralCache`].
pub trait DihedralSource {
    /// Returns the hinge of `edge`, or `None` unless the edge exists and has
    /// exactly two incident faces.
    fn hinge(&self, edge: EdgeId) -> Option<Hinge>;
}

impl DihedralSource for TopologyIndex {
    fn hinge(&self, edge: EdgeId) -> Option<Hinge> {
        let record = self.edge(edge).ok()?;
        let [f1, f2] = record.faces.as_slice() else {
            return None;
        };
        let [mut start, mut end] = self.edge_endpoints(edge).ok()?;
        let corners = self.face_corners(*f1).ok()?;
        let from = corners.iter().position(|&k| k == record.key.first())?;
        if corners[(from + 1) % 3] != record.key.second() {
            std::mem::swap(&mut start, &mut end);
        }
        Some(Hinge {
            start,
            end,
            first: self.face_vertices(*f1).ok()?,
            second: self.face_vertices(*f2).ok()?,
        })
    }
}

impl<T: DihedralSource + ?Sized> DihedralSource for &T {
    fn hinge(&self, edge: EdgeId) -> Option<Hinge> {
        (**self).hinge(edge)
    }
}

impl<T: DihedralSource + ?Sized> DihedralSource for Rc<T> {
    fn hinge(&self, edge: EdgeId) -> Option<Hinge> {
        (**self).hinge(edge)
    }
}

/// Signed dihedral angle of a hinge in radians.
///
/// With `d` the unit edge direction and `n1`, `n2` the normals of the first
/// and second face, the angle is `atan2(d · (n1 × n2), n1 · n2)`. On a
/// consistently wound surface, convex folds are positive and concave folds
/// negative; coplanar faces give `0`. The unfolding propagator and tab
/// generation rely on this convention.
///
/// Degenerate hinges (zero-length edge, zero-area face) measure `0`.
#[must_use]
pub fn signed_dihedral(hinge: &Hinge) -> f64 {
    let axis = hinge.end - hinge.start;
    let len = axis.norm();
    if len < TOLERANCE {
        return 0.0;
    }
    let [a1, b1, c1] = hinge.first;
    let [a2, b2, c2] = hinge.second;
    let n1 = (b1 - a1).cross(&(c1 - a1));
    let n2 = (b2 - a2).cross(&(c2 - a2));
    if n1.norm() < TOLERANCE || n2.norm() < TOLERANCE {
        return 0.0;
    }
    signed_angle(&n1.normalize(), &n2.normalize(), &(axis / len))
}

/// Lazily filled edge → dihedral angle table.
///
/// The cache is bound to one geometry source at a time. Attaching a new
/// source drops every entry.
#[derive(Debug)]
pub struct DihedralCache<S> {
    source: Option<S>,
    angles: HashMap<EdgeId, f64>,
}

impl<S> Default for DihedralCache<S> {
    fn default() -> Self {
        Self {
            source: None,
            angles: HashMap::new(),
        }
    }
}

impl<S: DihedralSource> DihedralCache<S> {
    /// Creates a cache with no source attached; every angle reads `0`.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a cache bound to `source`.
    #[must_use]
    pub fn with_source(source: S) -> Self {
        Self {
            source: Some(source),
            angles: HashMap::new(),
        }
    }

    /// Rebinds the cache to a new source and clears it.
    pub fn attach(&mut self, source: S) {
        self.source = Some(source);
        self.angles.clear();
    }

    /// Drops all memoized angles.
    pub fn clear(&mut self) {
        self.angles.clear();
    }

    /// The attached source, if any.
    #[must_use]
    pub fn source(&self) -> Option<&S> {
        self.source.as_ref()
    }

    /// Number of memoized entries.
    #[must_use]
    pub fn cached_len(&self) -> usize {
        self.angles.len()
    }

    /// Signed dihedral angle of `edge` in radians, computed at most once.
    ///
    /// Missing edges and edges without exactly two faces read `0`.
    pub fn angle(&mut self, edge: EdgeId) -> f64 {
        let Some(source) = &self.source else {
            return 0.0;
        };
        *self
            .angles
            .entry(edge)
            .or_insert_with(|| source.hinge(edge).map_or(0.0, |h| signed_dihedral(&h)))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::cell::Cell;
    use std::f64::consts::FRAC_PI_4;

    use approx::assert_relative_eq;

    use super::*;
    use crate::mesh::{Scene, Submesh};
    use crate::topology::{BuildTopology, FaceId};

    fn p(x: f64, y: f64, z: f64) -> Point3 {
        Point3::new(x, y, z)
    }

    /// Two triangles on the edge (0,0,0)-(1,0,0); the second apex is lifted by `h`.
    fn hinge_topology(h: f64) -> TopologyIndex {
        let mut scene = Scene::new();
        scene.add_submesh(Submesh::indexed(
            "hinge",
            vec![p(0.0, 0.0, 0.0), p(1.0, 0.0, 0.0), p(0.0, 1.0, 0.0), p(0.5, -1.0, h)],
            vec![0, 1, 2, 1, 0, 3],
        ));
        BuildTopology::new(&scene).execute()
    }

    struct CountingSource {
        calls: Cell<usize>,
        hinge: Hinge,
    }

    impl DihedralSource for CountingSource {
        fn hinge(&self, _edge: EdgeId) -> Option<Hinge> {
            self.calls.set(self.calls.get() + 1);
            Some(self.hinge)
        }
    }

    #[test]
    fn coplanar_faces_are_flat() {
        let topo = hinge_topology(0.0);
        let edge = topo.edge_between(FaceId(0), FaceId(1)).unwrap();
        let mut cache = DihedralCache::with_source(&topo);
        assert_relative_eq!(cache.angle(edge), 0.0);
    }

    #[test]
    fn fold_direction_sets_sign() {
        let up = hinge_topology(1.0);
        let edge = up.edge_between(FaceId(0), FaceId(1)).unwrap();
        assert_relative_eq!(DihedralCache::with_source(&up).angle(edge), -FRAC_PI_4, epsilon = 1e-12);

        let down = hinge_topology(-1.0);
        let edge = down.edge_between(FaceId(0), FaceId(1)).unwrap();
        assert_relative_eq!(DihedralCache::with_source(&down).angle(edge), FRAC_PI_4, epsilon = 1e-12);
    }

    fn tetrahedron(flip: bool) -> TopologyIndex {
        let mut indices = vec![0, 2, 1, 0, 1, 3, 1, 2, 3, 0, 3, 2];
        if flip {
            indices.chunks_mut(3).for_each(|tri| tri.swap(1, 2));
        }
        let mut scene = Scene::new();
        scene.add_submesh(Submesh::indexed(
            "tet",
            vec![p(0.0, 0.0, 0.0), p(1.0, 0.0, 0.0), p(0.0, 1.0, 0.0), p(0.0, 0.0, 1.0)],
            indices,
        ));
        BuildTopology::new(&scene).execute()
    }

    #[test]
    fn convex_closed_mesh_has_one_sign() {
        let outward = tetrahedron(false);
        let mut cache = DihedralCache::with_source(&outward);
        let angles: Vec<f64> = outward.edges().map(|e| cache.angle(e.id)).collect();
        assert_eq!(angles.len(), 6);
        assert!(angles.iter().all(|&a| a > 0.0), "{angles:?}");

        // Reversing every face turns the solid inside out.
        let inward = tetrahedron(true);
        let mut cache = DihedralCache::with_source(&inward);
        for e in inward.edges() {
            assert!(cache.angle(e.id) < 0.0);
        }
    }

    #[test]
    fn sign_ignores_face_order_on_the_edge() {
        let topo = tetrahedron(false);
        for e in topo.edges() {
            let hinge = topo.hinge(e.id).unwrap();
            let swapped = Hinge {
                start: hinge.end,
                end: hinge.start,
                first: hinge.second,
                second: hinge.first,
            };
            assert_relative_eq!(signed_dihedral(&hinge), signed_dihedral(&swapped), epsilon = 1e-12);
        }
    }

    #[test]
    fn hinge_axis_follows_first_face_winding() {
        let topo = tetrahedron(false);
        for e in topo.edges() {
            let hinge = topo.hinge(e.id).unwrap();
            let [a, b, c] = hinge.first;
            let runs_forward = [(a, b), (b, c), (c, a)]
                .iter()
                .any(|&(u, v)| u == hinge.start && v == hinge.end);
            assert!(runs_forward);
        }
    }

    #[test]
    fn boundary_and_missing_edges_read_zero() {
        let topo = hinge_topology(1.0);
        let boundary = topo.boundary_edges().next().unwrap().id;
        let mut cache = DihedralCache::with_source(&topo);
        assert_eq!(cache.angle(boundary), 0.0);
        assert_eq!(cache.angle(EdgeId(999)), 0.0);
    }

    #[test]
    fn angle_is_computed_once() {
        let source = CountingSource {
            calls: Cell::new(0),
            hinge: Hinge {
                start: p(0.0, 0.0, 0.0),
                end: p(1.0, 0.0, 0.0),
                first: [p(0.0, 0.0, 0.0), p(1.0, 0.0, 0.0), p(0.0, 1.0, 0.0)],
                second: [p(1.0, 0.0, 0.0), p(0.0, 0.0, 0.0), p(0.5, -1.0, 1.0)],
            },
        };
        let mut cache = DihedralCache::with_source(&source);
        let first = cache.angle(EdgeId(7));
        let second = cache.angle(EdgeId(7));
        assert_eq!(first.to_bits(), second.to_bits());
        assert_eq!(source.calls.get(), 1);

        cache.clear();
        cache.angle(EdgeId(7));
        assert_eq!(source.calls.get(), 2);
    }

    #[test]
    fn attach_clears_entries() {
        let a = hinge_topology(1.0);
        let b = hinge_topology(-1.0);
        let edge = a.edge_between(FaceId(0), FaceId(1)).unwrap();
        let mut cache = DihedralCache::with_source(&a);
        let before = cache.angle(edge);
        assert_eq!(cache.cached_len(), 1);
        cache.attach(&b);
        assert_eq!(cache.cached_len(), 0);
        assert_relative_eq!(cache.angle(edge), -before, epsilon = 1e-12);
    }

    #[test]
    fn detached_cache_reads_zero() {
        let mut cache: DihedralCache<Rc<TopologyIndex>> = DihedralCache::new();
        assert_eq!(cache.angle(EdgeId(0)), 0.0);
        assert_eq!(cache.cached_len(), 0);
    }

    #[test]
    fn degenerate_hinge_is_flat() {
        let hinge = Hinge {
            start: p(0.0, 0.0, 0.0),
            end: p(0.0, 0.0, 0.0),
            first: [p(0.0, 0.0, 0.0); 3],
            second: [p(0.0, 0.0, 0.0); 3],
        };
        assert_eq!(signed_dihedral(&hinge), 0.0);
    }
}
