mod submesh;

pub use submesh::{Submesh, SubmeshId};

use crate::error::TopologyError;
use crate::math::Isometry3;
use slotmap::SlotMap;

/// Hierarchical triangulated model handed over by the loading layer.
///
/// Submeshes live in an arena and reference their parent via typed IDs.
/// Iteration order is the arena order, which is deterministic for a given
/// insertion history.
#[derive(Debug, Default, Clone)]
pub struct Scene {
    submeshes: SlotMap<SubmeshId, Submesh>,
}

impl Scene {
    /// Creates a new, empty scene.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a submesh and returns its ID.
    pub fn add_submesh(&mut self, submesh: Submesh) -> SubmeshId {
        self.submeshes.insert(submesh)
    }

    /// Returns a reference to the submesh, or an error if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the submesh is not in the scene.
    pub fn submesh(&self, id: SubmeshId) -> Result<&Submesh, TopologyError> {
        self.submeshes
            .get(id)
            .ok_or_else(|| TopologyError::EntityNotFound("submesh".into()))
    }

    /// Returns a mutable reference to the submesh, or an error if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the submesh is not in the scene.
    pub fn submesh_mut(&mut self, id: SubmeshId) -> Result<&mut Submesh, TopologyError> {
        self.submeshes
            .get_mut(id)
            .ok_or_else(|| TopologyError::EntityNotFound("submesh".into()))
    }

    /// Replaces the local placement of a submesh.
    ///
    /// # Errors
    ///
    /// Returns an error if the submesh is not in the scene.
    pub fn set_placement(&mut self, id: SubmeshId, placement: Isometry3) -> Result<(), TopologyError> {
        self.submesh_mut(id)?.placement = placement;
        Ok(())
    }

    /// Iterates all submeshes in arena order.
    pub fn iter(&self) -> impl Iterator<Item = (SubmeshId, &Submesh)> {
        self.submeshes.iter()
    }

    /// Number of submeshes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.submeshes.len()
    }

    /// Returns `true` if the scene holds no submeshes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.submeshes.is_empty()
    }

    /// Local-to-world transform of a submesh, composed up the parent chain.
    ///
    /// Missing parents end the chain; a cyclic parent chain is cut after
    /// visiting every submesh once.
    #[must_use]
    pub fn world_transform(&self, id: SubmeshId) -> Isometry3 {
        let mut transform = Isometry3::identity();
        let mut current = Some(id);
        let mut steps = 0;
        while let Some(cid) = current {
            let Some(sub) = self.submeshes.get(cid) else {
                break;
            };
            transform = sub.placement * transform;
            current = sub.parent;
            steps += 1;
            if steps > self.submeshes.len() {
                break;
            }
        }
        transform
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use approx::assert_relative_eq;
    use nalgebra::Translation3;

    use super::*;
    use crate::math::{Point3, Vector3};

    #[test]
    fn world_transform_composes_parents() {
        let mut scene = Scene::new();
        let root = scene.add_submesh(
            Submesh::triangle_soup("root", vec![])
                .with_placement(Translation3::new(1.0, 0.0, 0.0).into()),
        );
        let child = scene.add_submesh(
            Submesh::triangle_soup("child", vec![])
                .with_placement(Translation3::new(0.0, 2.0, 0.0).into())
                .with_parent(root),
        );
        let world = scene.world_transform(child) * Point3::origin();
        assert_relative_eq!(world, Point3::new(1.0, 2.0, 0.0));
    }

    #[test]
    fn set_placement_updates_world_transform() {
        let mut scene = Scene::new();
        let id = scene.add_submesh(Submesh::triangle_soup("a", vec![]));
        scene
            .set_placement(id, Isometry3::translation(0.0, 0.0, 3.0))
            .unwrap();
        let moved = scene.world_transform(id) * Point3::origin();
        assert_relative_eq!(moved.coords, Vector3::new(0.0, 0.0, 3.0));
    }

    #[test]
    fn missing_submesh_is_an_error() {
        let mut scene = Scene::new();
        let id = scene.add_submesh(Submesh::triangle_soup("a", vec![]));
        let other = Scene::new();
        assert!(other.submesh(id).is_err());
        assert!(scene.submesh_mut(id).is_ok());
    }
}
