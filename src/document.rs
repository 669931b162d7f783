use std::collections::HashMap;
use std::rc::Rc;

use crate::dihedral::DihedralCache;
use crate::error::{GroupError, ImportError, Result};
use crate::groups::{
    records_from_json, records_to_json, Deletion, GroupId, GroupRecord, GroupStore, Invalidation,
};
use crate::math::Isometry3;
use crate::mesh::{Scene, SubmeshId};
use crate::topology::{BuildTopology, EdgeId, FaceId, TopologyIndex};
use crate::unfold::{classify_edge, edge_report, EdgeClass, EdgeReport, GroupLayout, UnfoldGroup};

/// The editing context for one loaded model: the scene together with its
/// partition, angle cache and layouts.
///
/// Every mutation runs to completion before returning and reports which
/// groups it invalidated; cached layouts of those groups are dropped and
/// rebuilt on the next [`layout`](Self::layout) call.
#[derive(Debug)]
pub struct UnfoldDocument {
    scene: Scene,
    topology: Rc<TopologyIndex>,
    angles: DihedralCache<Rc<TopologyIndex>>,
    groups: GroupStore,
    layouts: HashMap<GroupId, GroupLayout>,
}

impl Default for UnfoldDocument {
    fn default() -> Self {
        Self::from_scene(Scene::new())
    }
}

impl UnfoldDocument {
    /// Builds the topology of `scene` and starts with an empty partition.
    #[must_use]
    pub fn from_scene(scene: Scene) -> Self {
        let topology = Rc::new(BuildTopology::new(&scene).execute());
        Self {
            angles: DihedralCache::with_source(Rc::clone(&topology)),
            groups: GroupStore::new(Rc::clone(&topology)),
            topology,
            scene,
            layouts: HashMap::new(),
        }
    }

    /// Replaces the model. Topology, angles, groups and layouts are reset.
    pub fn load(&mut self, scene: Scene) {
        let topology = Rc::new(BuildTopology::new(&scene).execute());
        self.angles.attach(Rc::clone(&topology));
        self.groups = GroupStore::new(Rc::clone(&topology));
        self.topology = topology;
        self.scene = scene;
        self.layouts.clear();
    }

    /// The loaded scene.
    #[must_use]
    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    /// The topology of the loaded scene.
    #[must_use]
    pub fn topology(&self) -> &TopologyIndex {
        &self.topology
    }

    /// The current partition.
    #[must_use]
    pub fn groups(&self) -> &GroupStore {
        &self.groups
    }

    /// Moves a submesh. World positions are refreshed and every cached angle
    /// and layout is dropped; adjacency and groups are unaffected.
    ///
    /// # Errors
    ///
    /// Returns an error if the submesh is not in the scene.
    pub fn set_placement(&mut self, submesh: SubmeshId, placement: Isometry3) -> Result<()> {
        self.scene.set_placement(submesh, placement)?;
        let mut topology = (*self.topology).clone();
        topology.refresh_world_positions(&self.scene);
        let topology = Rc::new(topology);
        self.angles.attach(Rc::clone(&topology));
        self.groups.rebind(Rc::clone(&topology));
        self.topology = topology;
        self.layouts.clear();
        Ok(())
    }

    /// See [`GroupStore::add_face`].
    ///
    /// # Errors
    ///
    /// Returns the store's rejection unchanged.
    pub fn add_face(&mut self, face: FaceId, group: GroupId) -> std::result::Result<Invalidation, GroupError> {
        let invalidation = self.groups.add_face(face, group)?;
        self.invalidate(&invalidation);
        Ok(invalidation)
    }

    /// See [`GroupStore::remove_face`].
    ///
    /// # Errors
    ///
    /// Returns the store's rejection unchanged.
    pub fn remove_face(&mut self, face: FaceId, group: GroupId) -> std::result::Result<Invalidation, GroupError> {
        let invalidation = self.groups.remove_face(face, group)?;
        self.invalidate(&invalidation);
        Ok(invalidation)
    }

    /// See [`GroupStore::create_group`].
    pub fn create_group(&mut self) -> GroupId {
        self.groups.create_group()
    }

    /// See [`GroupStore::delete_group`]. Layouts of the deleted group and of
    /// every renumbered group are dropped.
    ///
    /// # Errors
    ///
    /// Returns the store's rejection unchanged.
    pub fn delete_group(&mut self, group: GroupId) -> std::result::Result<Deletion, GroupError> {
        let deletion = self.groups.delete_group(group)?;
        self.layouts.retain(|&id, _| id < group);
        Ok(deletion)
    }

    /// Sets a group's display name.
    ///
    /// # Errors
    ///
    /// Returns [`GroupError::GroupNotFound`] if the group does not exist.
    pub fn set_group_name(&mut self, group: GroupId, name: Option<String>) -> std::result::Result<(), GroupError> {
        self.groups.set_group_name(group, name)
    }

    /// Sets a group's layout rotation and drops its cached layout.
    ///
    /// # Errors
    ///
    /// Returns [`GroupError::GroupNotFound`] if the group does not exist.
    pub fn set_place_angle(&mut self, group: GroupId, angle: Option<f64>) -> std::result::Result<(), GroupError> {
        self.groups.set_place_angle(group, angle)?;
        self.layouts.remove(&group);
        Ok(())
    }

    /// Sets the preview/selection target.
    ///
    /// # Errors
    ///
    /// Returns [`GroupError::GroupNotFound`] if the group does not exist.
    pub fn set_active_group(&mut self, group: GroupId) -> std::result::Result<(), GroupError> {
        self.groups.set_active_group(group)
    }

    /// See [`GroupStore::import_groups`]; the records are trusted.
    pub fn import_groups(&mut self, records: &[GroupRecord]) -> Invalidation {
        self.layouts.clear();
        self.groups.import_groups(records)
    }

    /// See [`GroupStore::import_groups_checked`].
    ///
    /// # Errors
    ///
    /// Returns the first problem found; nothing is changed in that case.
    pub fn import_groups_checked(&mut self, records: &[GroupRecord]) -> std::result::Result<Invalidation, ImportError> {
        let invalidation = self.groups.import_groups_checked(records)?;
        self.layouts.clear();
        Ok(invalidation)
    }

    /// Parses and validates a persisted JSON group list, then imports it.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or the groups fail validation.
    pub fn import_json(&mut self, json: &str) -> Result<Invalidation> {
        let records = records_from_json(json)?;
        Ok(self.import_groups_checked(&records)?)
    }

    /// The partition in its persisted shape.
    #[must_use]
    pub fn export_groups(&self) -> Vec<GroupRecord> {
        self.groups.export_groups()
    }

    /// The partition as persisted JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn export_json(&self) -> Result<String> {
        records_to_json(&self.groups.export_groups())
    }

    /// Flattened layout of `group`, computed on first use after each change.
    ///
    /// # Errors
    ///
    /// Returns an error if the group does not exist.
    pub fn layout(&mut self, group: GroupId) -> Result<&GroupLayout> {
        if !self.layouts.contains_key(&group) {
            let layout = UnfoldGroup::new(self.groups.group(group)?).execute(&self.topology)?;
            self.layouts.insert(group, layout);
        }
        Ok(self
            .layouts
            .get(&group)
            .ok_or(GroupError::GroupNotFound(group))?)
    }

    /// Signed dihedral angle of `edge`.
    pub fn dihedral(&mut self, edge: EdgeId) -> f64 {
        self.angles.angle(edge)
    }

    /// Fold/seam classification of `edge`.
    #[must_use]
    pub fn edge_class(&self, edge: EdgeId) -> EdgeClass {
        classify_edge(&self.groups, edge)
    }

    /// Classification and dihedral angle of every edge.
    pub fn edge_report(&mut self) -> Vec<EdgeReport> {
        edge_report(&self.groups, &mut self.angles)
    }

    fn invalidate(&mut self, invalidation: &Invalidation) {
        for group in &invalidation.groups {
            self.layouts.remove(group);
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;
    use crate::error::PapercutError;
    use crate::math::Point3;
    use crate::mesh::Submesh;

    fn p(x: f64, y: f64, z: f64) -> Point3 {
        Point3::new(x, y, z)
    }

    fn hinge_scene() -> (Scene, SubmeshId) {
        let mut scene = Scene::new();
        let id = scene.add_submesh(Submesh::indexed(
            "hinge",
            vec![p(0.0, 0.0, 0.0), p(1.0, 0.0, 0.0), p(0.0, 1.0, 0.0), p(0.5, -1.0, 1.0)],
            vec![0, 1, 2, 1, 0, 3],
        ));
        (scene, id)
    }

    #[test]
    fn mutations_invalidate_cached_layouts() {
        let (scene, _) = hinge_scene();
        let mut doc = UnfoldDocument::from_scene(scene);
        doc.add_face(FaceId(0), GroupId(1)).unwrap();
        assert_eq!(doc.layout(GroupId(1)).unwrap().len(), 1);

        let inv = doc.add_face(FaceId(1), GroupId(1)).unwrap();
        assert_eq!(inv.groups, vec![GroupId(1)]);
        assert_eq!(doc.layout(GroupId(1)).unwrap().len(), 2);

        doc.remove_face(FaceId(0), GroupId(1)).unwrap();
        assert_eq!(doc.layout(GroupId(1)).unwrap().len(), 1);
    }

    #[test]
    fn fold_and_dihedral_are_exposed() {
        let (scene, _) = hinge_scene();
        let mut doc = UnfoldDocument::from_scene(scene);
        let edge = doc.topology().edge_between(FaceId(0), FaceId(1)).unwrap();
        assert_eq!(doc.edge_class(edge), EdgeClass::Seam);
        doc.add_face(FaceId(0), GroupId(1)).unwrap();
        doc.add_face(FaceId(1), GroupId(1)).unwrap();
        assert_eq!(doc.edge_class(edge), EdgeClass::Fold);
        assert_relative_eq!(doc.dihedral(edge), -std::f64::consts::FRAC_PI_4, epsilon = 1e-12);
        let report = doc.edge_report();
        assert_eq!(report.len(), 5);
    }

    #[test]
    fn placement_change_refreshes_geometry() {
        let (scene, id) = hinge_scene();
        let mut doc = UnfoldDocument::from_scene(scene);
        doc.add_face(FaceId(0), GroupId(1)).unwrap();
        doc.add_face(FaceId(1), GroupId(1)).unwrap();
        let edge = doc.topology().edge_between(FaceId(0), FaceId(1)).unwrap();
        let before = doc.dihedral(edge);
        let flat_before = doc.layout(GroupId(1)).unwrap().clone();

        let turn = Isometry3::new(
            nalgebra::Vector3::new(3.0, -2.0, 1.0),
            nalgebra::Vector3::new(0.3, 0.7, -0.2),
        );
        doc.set_placement(id, turn).unwrap();
        let [a, _, _] = doc.topology().face_vertices(FaceId(0)).unwrap();
        assert_relative_eq!(a, turn * p(0.0, 0.0, 0.0), epsilon = 1e-12);

        // Rigid motion keeps the dihedral angle and the flattened shape.
        assert_relative_eq!(doc.dihedral(edge), before, epsilon = 1e-9);
        let flat_after = doc.layout(GroupId(1)).unwrap();
        for (face, flat) in &flat_before.faces {
            let moved = flat_after.face(*face).unwrap();
            for i in 0..3 {
                for j in 0..3 {
                    let d0 = (flat.points[i] - flat.points[j]).norm();
                    let d1 = (moved.points[i] - moved.points[j]).norm();
                    assert_relative_eq!(d0, d1, epsilon = 1e-9);
                }
            }
        }
        assert_eq!(doc.groups().faces_of(GroupId(1)).len(), 2);
    }

    #[test]
    fn load_resets_everything() {
        let (scene, _) = hinge_scene();
        let mut doc = UnfoldDocument::from_scene(scene);
        doc.add_face(FaceId(0), GroupId(1)).unwrap();
        doc.create_group();
        doc.load(Scene::new());
        assert_eq!(doc.topology().face_count(), 0);
        assert_eq!(doc.groups().group_count(), 1);
        assert!(doc.layout(GroupId(1)).unwrap().is_empty());
        assert_eq!(doc.dihedral(EdgeId(0)), 0.0);
    }

    #[test]
    fn json_round_trip_through_document() {
        let (scene, _) = hinge_scene();
        let mut doc = UnfoldDocument::from_scene(scene.clone());
        doc.add_face(FaceId(0), GroupId(1)).unwrap();
        doc.add_face(FaceId(1), GroupId(2)).unwrap();
        doc.set_group_name(GroupId(2), Some("flap".into())).unwrap();
        doc.set_place_angle(GroupId(2), Some(0.5)).unwrap();
        let json = doc.export_json().unwrap();

        let mut other = UnfoldDocument::from_scene(scene);
        let inv = other.import_json(&json).unwrap();
        assert_eq!(inv.groups, vec![GroupId(1), GroupId(2)]);
        assert_eq!(other.export_groups(), doc.export_groups());
        assert_eq!(other.layout(GroupId(2)).unwrap().len(), 1);
    }

    #[test]
    fn invalid_json_import_is_reported() {
        let mut doc = UnfoldDocument::from_scene(hinge_scene().0);
        assert!(matches!(doc.import_json("not json"), Err(PapercutError::Json(_))));
        assert!(matches!(
            doc.import_json(r##"[{"id": 1, "color": "#000000", "faces": [8]}]"##),
            Err(PapercutError::Import(ImportError::FaceOutOfRange { .. }))
        ));
    }

    #[test]
    fn delete_drops_renumbered_layouts() {
        let (scene, _) = hinge_scene();
        let mut doc = UnfoldDocument::from_scene(scene);
        doc.add_face(FaceId(0), GroupId(1)).unwrap();
        doc.add_face(FaceId(1), GroupId(2)).unwrap();
        assert_eq!(doc.layout(GroupId(2)).unwrap().len(), 1);
        let deletion = doc.delete_group(GroupId(1)).unwrap();
        assert_eq!(deletion.fallback, GroupId(1));
        let layout = doc.layout(GroupId(1)).unwrap();
        assert_eq!(layout.group, GroupId(1));
        assert!(layout.face(FaceId(1)).is_some());
        assert!(matches!(
            doc.layout(GroupId(2)),
            Err(PapercutError::Group(GroupError::GroupNotFound(_)))
        ));
    }
}
