use std::collections::{BTreeMap, HashMap};

use nalgebra::Translation3;

use crate::error::TopologyError;
use crate::groups::{Group, GroupId};
use crate::math::rotation::{project_onto_plane, rotation_about_axis, shortest_arc, signed_angle};
use crate::math::triangle::triangle_normal;
use crate::math::{Bounds2, Isometry3, Point2, Point3, Vector3, TOLERANCE};
use crate::topology::{FaceId, TopologyIndex};

/// Normal of the flattening plane. Flattened faces lie in `z = 0`.
#[must_use]
pub fn flatten_normal() -> Vector3 {
    Vector3::z()
}

/// One face mapped into its group's flattening plane.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlatFace {
    /// The face.
    pub face: FaceId,
    /// The face's own transform: root alignment or hinge rotation.
    pub local: Isometry3,
    /// Full world-to-plane transform: own transform, then every ancestor's,
    /// then the group's placement rotation.
    pub transform: Isometry3,
    /// Flattened corners, in source winding.
    pub points: [Point2; 3],
}

/// Flattened layout of one unfold group.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupLayout {
    /// The group.
    pub group: GroupId,
    /// Flattened faces by id.
    pub faces: BTreeMap<FaceId, FlatFace>,
    /// Bounding box of all flattened corners; `None` for empty groups.
    pub bounds: Option<Bounds2>,
}

impl GroupLayout {
    /// Flattened face, if it belongs to the group.
    #[must_use]
    pub fn face(&self, face: FaceId) -> Option<&FlatFace> {
        self.faces.get(&face)
    }

    /// Number of flattened faces.
    #[must_use]
    pub fn len(&self) -> usize {
        self.faces.len()
    }

    /// Returns `true` if no face was flattened.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.faces.is_empty()
    }
}

/// Flattens a group along its spanning tree.
///
/// Each root is rotated so its normal matches [`flatten_normal`] with its
/// first corner at the origin. Each child is rotated about the edge it
/// shares with its parent until both normals agree, which opens the fold
/// whether it is convex or concave. A face's transform is its own rotation
/// composed with its ancestors' up to the root.
pub struct UnfoldGroup<'a> {
    group: &'a Group,
}

impl<'a> UnfoldGroup<'a> {
    /// Creates a new `UnfoldGroup` operation.
    #[must_use]
    pub fn new(group: &'a Group) -> Self {
        Self { group }
    }

    /// Executes the flattening.
    ///
    /// # Errors
    ///
    /// Returns an error if the group references faces outside `topology`.
    pub fn execute(&self, topology: &TopologyIndex) -> Result<GroupLayout, TopologyError> {
        let tree = self.group.tree();
        let place = Isometry3::rotation(flatten_normal() * self.group.place_angle().unwrap_or(0.0));

        let mut chains: HashMap<FaceId, Isometry3> = HashMap::with_capacity(tree.len());
        let mut faces = BTreeMap::new();
        for &face in tree.attach_order() {
            let vertices = topology.face_vertices(face)?;
            let (local, chain) = match tree.parent(face) {
                None => {
                    let local = root_transform(&vertices);
                    (local, local)
                }
                Some(parent) => {
                    let local = hinge_transform(topology, face, parent, &vertices)?;
                    let chain = chains.get(&parent).map_or(local, |up| up * local);
                    (local, chain)
                }
            };
            chains.insert(face, chain);

            let transform = place * chain;
            let points = vertices.map(|v| {
                let q = transform * v;
                Point2::new(q.x, q.y)
            });
            faces.insert(
                face,
                FlatFace {
                    face,
                    local,
                    transform,
                    points,
                },
            );
        }

        let bounds = Bounds2::from_points(faces.values().flat_map(|f| f.points.iter()));
        tracing::debug!(group = %self.group.id(), faces = faces.len(), "flattened group");
        Ok(GroupLayout {
            group: self.group.id(),
            faces,
            bounds,
        })
    }
}

/// Rotation of a root face into the flattening plane, pivoted at its first
/// corner, which lands on the origin.
fn root_transform(vertices: &[Point3; 3]) -> Isometry3 {
    let [a, b, c] = vertices;
    let rot = shortest_arc(&triangle_normal(a, b, c), &flatten_normal());
    Isometry3::from_parts(Translation3::from(-(rot * a.coords)), rot)
}

/// Rotation of `child` about the edge it shares with `parent` that makes the
/// two faces coplanar.
fn hinge_transform(
    topology: &TopologyIndex,
    child: FaceId,
    parent: FaceId,
    vertices: &[Point3; 3],
) -> Result<Isometry3, TopologyError> {
    let child_normal = topology.face_normal(child)?;
    let parent_normal = topology.face_normal(parent)?;

    let Some(edge) = topology.edge_between(child, parent) else {
        // Only faces forced onto a root lack a shared edge; lay them flat
        // in the parent's plane around their own first corner.
        tracing::warn!(face = %child, parent = %parent, "no shared edge, aligning normals only");
        let rot = shortest_arc(&child_normal, &parent_normal);
        let pivot = vertices[0].coords;
        return Ok(Translation3::from(pivot) * rot * Translation3::from(-pivot));
    };

    let [start, end] = topology.edge_endpoints(edge)?;
    let axis = end - start;
    if axis.norm() < TOLERANCE {
        return Ok(Isometry3::identity());
    }
    let axis = axis.normalize();
    let angle = signed_angle(
        &project_onto_plane(&child_normal, &axis),
        &project_onto_plane(&parent_normal, &axis),
        &axis,
    );
    Ok(rotation_about_axis(&start, &axis, angle))
}
