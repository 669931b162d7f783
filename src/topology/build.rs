use std::collections::{BTreeSet, HashMap};

use crate::mesh::Scene;

use super::edge::{Edge, EdgeId, EdgeKey};
use super::face::{FaceId, FaceRecord, FaceSource};
use super::vertex::{VertexKey, WeldedVertex};
use super::TopologyIndex;

/// Builds a [`TopologyIndex`] from a scene.
///
/// Faces are numbered sequentially while walking non-functional submeshes
/// in arena order and their triangles in buffer order. Building never fails:
/// submeshes without positions contribute no faces, and an empty scene
/// yields an empty index.
pub struct BuildTopology<'a> {
    scene: &'a Scene,
}

impl<'a> BuildTopology<'a> {
    /// Creates a new `BuildTopology` operation.
    #[must_use]
    pub fn new(scene: &'a Scene) -> Self {
        Self { scene }
    }

    /// Executes the build.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn execute(&self) -> TopologyIndex {
        let mut faces = Vec::new();
        let mut face_edges = Vec::new();
        let mut edges: Vec<Edge> = Vec::new();
        let mut edge_ids: HashMap<EdgeKey, EdgeId> = HashMap::new();
        let mut positions = HashMap::new();
        let mut triangle_count = 0;

        for (sid, submesh) in self.scene.iter() {
            if submesh.functional {
                continue;
            }
            triangle_count += submesh.declared_triangles();
            if submesh.positions.is_empty() {
                tracing::debug!(submesh = %submesh.name, "skipping submesh without positions");
                continue;
            }

            let world = self.scene.world_transform(sid);
            for (local_index, tri) in submesh.triangles() {
                let face = FaceId(faces.len() as u32);
                let corners = tri.map(|i| {
                    let local = submesh.positions[i];
                    let key = VertexKey::new(&local);
                    positions.entry(key).or_insert_with(|| WeldedVertex {
                        owner: sid,
                        position: world * local,
                    });
                    key
                });

                let mut ids = [EdgeId(0); 3];
                for (slot, (a, b)) in [(0, 1), (1, 2), (2, 0)].into_iter().enumerate() {
                    let key = EdgeKey::new(corners[a], corners[b]);
                    let id = *edge_ids.entry(key).or_insert_with(|| {
                        let id = EdgeId(edges.len() as u32);
                        edges.push(Edge {
                            id,
                            key,
                            faces: Vec::new(),
                        });
                        id
                    });
                    let incident = &mut edges[id.index()].faces;
                    if !incident.contains(&face) {
                        incident.push(face);
                    }
                    ids[slot] = id;
                }

                faces.push(FaceRecord {
                    source: FaceSource {
                        submesh: sid,
                        local_index,
                    },
                    corners,
                });
                face_edges.push(ids);
            }
        }

        // Every pair of faces on a shared edge is adjacent, so non-manifold
        // junctions become cliques.
        let mut adjacency = vec![BTreeSet::new(); faces.len()];
        for edge in &edges {
            for (i, &a) in edge.faces.iter().enumerate() {
                for &b in &edge.faces[i + 1..] {
                    adjacency[a.index()].insert(b);
                    adjacency[b.index()].insert(a);
                }
            }
        }

        tracing::debug!(
            faces = faces.len(),
            edges = edges.len(),
            vertices = positions.len(),
            triangle_count,
            "built topology index"
        );

        TopologyIndex {
            faces,
            face_edges,
            adjacency,
            edges,
            edge_ids,
            positions,
            triangle_count,
        }
    }
}
