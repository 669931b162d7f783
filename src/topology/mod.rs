mod build;
pub mod edge;
pub mod face;
pub mod vertex;

pub use build::BuildTopology;
pub use edge::{Edge, EdgeId, EdgeKey, EdgeKind};
pub use face::{FaceId, FaceSource};
pub use vertex::VertexKey;

use std::collections::{BTreeSet, HashMap};

use crate::error::TopologyError;
use crate::math::triangle::triangle_normal;
use crate::math::{Point3, Vector3};
use crate::mesh::Scene;
use face::FaceRecord;
use vertex::WeldedVertex;

/// Face/edge/vertex adjacency of a triangulated scene.
///
/// This is the prepared-geometry bundle every other part of the engine
/// reads from: face adjacency, face sources, face-to-edge table, the edge
/// table with its key map, and world positions of welded vertices.
/// It is immutable after [`BuildTopology`] except for world positions,
/// which follow placement changes through [`refresh_world_positions`].
///
/// [`refresh_world_positions`]: TopologyIndex::refresh_world_positions
#[derive(Debug, Default, Clone)]
pub struct TopologyIndex {
    faces: Vec<FaceRecord>,
    face_edges: Vec<[EdgeId; 3]>,
    adjacency: Vec<BTreeSet<FaceId>>,
    edges: Vec<Edge>,
    edge_ids: HashMap<EdgeKey, EdgeId>,
    positions: HashMap<VertexKey, WeldedVertex>,
    triangle_count: usize,
}

impl TopologyIndex {
    /// Creates an empty, inert index.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of faces.
    #[must_use]
    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    /// Number of distinct edges.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Declared triangle count of all non-functional submeshes.
    ///
    /// This counts what the buffers declare, not what became faces: a
    /// submesh without positions still adds its `index_count / 3` here while
    /// contributing no faces, and triangles skipped for out-of-range indices
    /// are counted too. Compare with [`face_count`](Self::face_count) to
    /// detect dropped geometry.
    #[must_use]
    pub fn triangle_count(&self) -> usize {
        self.triangle_count
    }

    /// Returns `true` if `face` belongs to this index.
    #[must_use]
    pub fn contains_face(&self, face: FaceId) -> bool {
        face.index() < self.faces.len()
    }

    /// Iterates all face ids in order.
    #[allow(clippy::cast_possible_truncation)]
    pub fn face_ids(&self) -> impl Iterator<Item = FaceId> {
        (0..self.faces.len()).map(|i| FaceId(i as u32))
    }

    /// Faces sharing at least one edge with `face`.
    ///
    /// Unknown faces have no neighbors.
    #[must_use]
    pub fn neighbors(&self, face: FaceId) -> &BTreeSet<FaceId> {
        static EMPTY: BTreeSet<FaceId> = BTreeSet::new();
        self.adjacency.get(face.index()).unwrap_or(&EMPTY)
    }

    /// Returns `true` if the two faces share an edge.
    #[must_use]
    pub fn are_adjacent(&self, a: FaceId, b: FaceId) -> bool {
        self.neighbors(a).contains(&b)
    }

    /// Source triangle of a face.
    ///
    /// # Errors
    ///
    /// Returns an error if the face is outside the index.
    pub fn face_source(&self, face: FaceId) -> Result<FaceSource, TopologyError> {
        self.face_record(face).map(|r| r.source)
    }

    /// The three edges of a face, in corner order `(0,1)`, `(1,2)`, `(2,0)`.
    ///
    /// # Errors
    ///
    /// Returns an error if the face is outside the index.
    pub fn face_edges(&self, face: FaceId) -> Result<[EdgeId; 3], TopologyError> {
        self.face_edges
            .get(face.index())
            .copied()
            .ok_or(TopologyError::FaceOutOfRange(face))
    }

    /// Vertex keys of a face's corners, following the source winding.
    ///
    /// # Errors
    ///
    /// Returns an error if the face is outside the index.
    pub fn face_corners(&self, face: FaceId) -> Result<[VertexKey; 3], TopologyError> {
        self.face_record(face).map(|r| r.corners)
    }

    /// World-space corners of a face, following the source winding.
    ///
    /// # Errors
    ///
    /// Returns an error if the face is outside the index.
    pub fn face_vertices(&self, face: FaceId) -> Result<[Point3; 3], TopologyError> {
        let [a, b, c] = self.face_corners(face)?;
        Ok([
            self.world_position(&a)?,
            self.world_position(&b)?,
            self.world_position(&c)?,
        ])
    }

    /// World-space unit normal of a face; `(0, 0, 1)` for degenerate faces.
    ///
    /// # Errors
    ///
    /// Returns an error if the face is outside the index.
    pub fn face_normal(&self, face: FaceId) -> Result<Vector3, TopologyError> {
        let [a, b, c] = self.face_vertices(face)?;
        Ok(triangle_normal(&a, &b, &c))
    }

    /// Returns the edge with the given id.
    ///
    /// # Errors
    ///
    /// Returns an error if the edge is not in the table.
    pub fn edge(&self, id: EdgeId) -> Result<&Edge, TopologyError> {
        self.edges
            .get(id.index())
            .ok_or_else(|| TopologyError::EntityNotFound(format!("edge {id}")))
    }

    /// Iterates the edge table.
    pub fn edges(&self) -> impl Iterator<Item = &Edge> {
        self.edges.iter()
    }

    /// Looks up an edge by its endpoint keys.
    #[must_use]
    pub fn edge_id(&self, key: &EdgeKey) -> Option<EdgeId> {
        self.edge_ids.get(key).copied()
    }

    /// The edge shared by faces `a` and `b`, if any.
    #[must_use]
    pub fn edge_between(&self, a: FaceId, b: FaceId) -> Option<EdgeId> {
        let edges = self.face_edges.get(a.index())?;
        edges.iter().copied().find(|&e| {
            self.edges
                .get(e.index())
                .is_some_and(|edge| edge.faces.contains(&b))
        })
    }

    /// World-space endpoints of an edge in key order.
    ///
    /// # Errors
    ///
    /// Returns an error if the edge is not in the table.
    pub fn edge_endpoints(&self, id: EdgeId) -> Result<[Point3; 2], TopologyError> {
        let key = self.edge(id)?.key;
        Ok([
            self.world_position(&key.first())?,
            self.world_position(&key.second())?,
        ])
    }

    /// Edges with exactly one incident face.
    pub fn boundary_edges(&self) -> impl Iterator<Item = &Edge> {
        self.edges.iter().filter(|e| e.kind() == EdgeKind::Boundary)
    }

    /// Edges with three or more incident faces.
    pub fn non_manifold_edges(&self) -> impl Iterator<Item = &Edge> {
        self.edges.iter().filter(|e| e.kind() == EdgeKind::NonManifold)
    }

    /// Current world position of a welded vertex.
    ///
    /// # Errors
    ///
    /// Returns an error if the key was never registered.
    pub fn world_position(&self, key: &VertexKey) -> Result<Point3, TopologyError> {
        self.positions
            .get(key)
            .map(|v| v.position)
            .ok_or_else(|| TopologyError::EntityNotFound("vertex".into()))
    }

    /// Number of welded vertices.
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    /// Recomputes every vertex's world position from the scene placements.
    ///
    /// A vertex shared by several submeshes follows the one that registered
    /// it first. Vertices whose submesh has disappeared keep their position.
    pub fn refresh_world_positions(&mut self, scene: &Scene) {
        for (key, vertex) in &mut self.positions {
            if scene.submesh(vertex.owner).is_ok() {
                vertex.position = scene.world_transform(vertex.owner) * key.local_position();
            }
        }
        tracing::debug!(vertices = self.positions.len(), "refreshed world positions");
    }

    fn face_record(&self, face: FaceId) -> Result<&FaceRecord, TopologyError> {
        self.faces
            .get(face.index())
            .ok_or(TopologyError::FaceOutOfRange(face))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;
    use crate::math::Isometry3;
    use crate::mesh::Submesh;

    fn p(x: f64, y: f64, z: f64) -> Point3 {
        Point3::new(x, y, z)
    }

    fn quad_scene() -> (Scene, crate::mesh::SubmeshId) {
        let mut scene = Scene::new();
        let id = scene.add_submesh(Submesh::indexed(
            "quad",
            vec![p(0.0, 0.0, 0.0), p(1.0, 0.0, 0.0), p(1.0, 1.0, 0.0), p(0.0, 1.0, 0.0)],
            vec![0, 1, 2, 0, 2, 3],
        ));
        (scene, id)
    }

    #[test]
    fn empty_index_is_inert() {
        let topo = TopologyIndex::new();
        assert_eq!(topo.face_count(), 0);
        assert!(topo.neighbors(FaceId(3)).is_empty());
        assert!(topo.face_vertices(FaceId(0)).is_err());
        assert!(topo.edge_between(FaceId(0), FaceId(1)).is_none());
    }

    #[test]
    fn edge_between_finds_shared_diagonal() {
        let (scene, _) = quad_scene();
        let topo = BuildTopology::new(&scene).execute();
        let e = topo.edge_between(FaceId(0), FaceId(1)).unwrap();
        let [a, b] = topo.edge_endpoints(e).unwrap();
        let mut ends = [a, b];
        ends.sort_by(|l, r| l.x.total_cmp(&r.x));
        assert_eq!(ends, [p(0.0, 0.0, 0.0), p(1.0, 1.0, 0.0)]);
        assert_eq!(topo.edge_between(FaceId(1), FaceId(0)), Some(e));
    }

    #[test]
    fn refresh_follows_placement() {
        let (mut scene, id) = quad_scene();
        let mut topo = BuildTopology::new(&scene).execute();
        scene
            .set_placement(id, Isometry3::translation(0.0, 0.0, 5.0))
            .unwrap();
        topo.refresh_world_positions(&scene);
        let [a, _, _] = topo.face_vertices(FaceId(0)).unwrap();
        assert_relative_eq!(a, p(0.0, 0.0, 5.0));
        assert_relative_eq!(topo.face_normal(FaceId(0)).unwrap(), Vector3::z());
    }

    #[test]
    fn refresh_moves_shared_vertices_with_their_owner() {
        let mut scene = Scene::new();
        let owner = scene.add_submesh(Submesh::indexed(
            "owner",
            vec![p(0.0, 0.0, 0.0), p(1.0, 0.0, 0.0), p(0.5, 1.0, 0.0)],
            vec![0, 1, 2],
        ));
        let other = scene.add_submesh(Submesh::indexed(
            "other",
            vec![p(1.0, 0.0, 0.0), p(0.0, 0.0, 0.0), p(0.5, -1.0, 0.0)],
            vec![0, 1, 2],
        ));
        let mut topo = BuildTopology::new(&scene).execute();

        scene
            .set_placement(owner, Isometry3::translation(0.0, 3.0, 0.0))
            .unwrap();
        scene
            .set_placement(other, Isometry3::translation(0.0, 0.0, 1.0))
            .unwrap();
        topo.refresh_world_positions(&scene);

        let [a, b, c] = topo.face_vertices(FaceId(1)).unwrap();
        assert_relative_eq!(a, p(1.0, 3.0, 0.0));
        assert_relative_eq!(b, p(0.0, 3.0, 0.0));
        assert_relative_eq!(c, p(0.5, -1.0, 1.0));
        assert!(topo.are_adjacent(FaceId(0), FaceId(1)));
    }
}
