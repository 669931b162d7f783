pub mod connectivity;
pub mod palette;
pub mod record;

pub use palette::{palette_color, Color, PALETTE};
pub use record::{records_from_json, records_to_json, GroupRecord};

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::error::{GroupError, ImportError};
use crate::topology::{FaceId, TopologyIndex};
use crate::unfold::SpanningTree;
use connectivity::{is_connected, reachable_count};

/// Positive identifier of an unfold group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GroupId(pub u32);

impl GroupId {
    /// The default group, which always exists.
    pub const DEFAULT: Self = Self(1);
}

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A connected set of faces cut out and folded as one paper panel.
#[derive(Debug, Clone)]
pub struct Group {
    id: GroupId,
    faces: Vec<FaceId>,
    color: Color,
    name: Option<String>,
    place_angle: Option<f64>,
    tree: SpanningTree,
}

impl Group {
    fn new(id: GroupId, color: Color) -> Self {
        Self {
            id,
            faces: Vec::new(),
            color,
            name: None,
            place_angle: None,
            tree: SpanningTree::default(),
        }
    }

    /// Group id.
    #[must_use]
    pub fn id(&self) -> GroupId {
        self.id
    }

    /// Member faces in membership order.
    #[must_use]
    pub fn faces(&self) -> &[FaceId] {
        &self.faces
    }

    /// Number of member faces.
    #[must_use]
    pub fn len(&self) -> usize {
        self.faces.len()
    }

    /// Returns `true` if the group has no members.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.faces.is_empty()
    }

    /// Returns `true` if `face` is a member.
    #[must_use]
    pub fn contains(&self, face: FaceId) -> bool {
        self.faces.contains(&face)
    }

    /// Display color.
    #[must_use]
    pub fn color(&self) -> Color {
        self.color
    }

    /// Display name, if set.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Layout rotation in radians, if set.
    #[must_use]
    pub fn place_angle(&self) -> Option<f64> {
        self.place_angle
    }

    /// Current spanning tree over the members.
    #[must_use]
    pub fn tree(&self) -> &SpanningTree {
        &self.tree
    }

    fn member_set(&self) -> BTreeSet<FaceId> {
        self.faces.iter().copied().collect()
    }

    fn rebuild_tree(&mut self, topology: &TopologyIndex) {
        self.tree = SpanningTree::build(&self.faces, topology);
        tracing::debug!(group = %self.id, faces = self.faces.len(), "rebuilt spanning tree");
    }
}

/// Groups whose spanning trees (and therefore flattenings) a mutation rebuilt.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Invalidation {
    /// Affected group ids, ascending.
    pub groups: Vec<GroupId>,
}

impl Invalidation {
    fn of(groups: impl IntoIterator<Item = GroupId>) -> Self {
        let mut groups: Vec<GroupId> = groups.into_iter().collect();
        groups.sort_unstable();
        groups.dedup();
        Self { groups }
    }

    /// Returns `true` if nothing was rebuilt.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

/// Outcome of [`GroupStore::delete_group`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Deletion {
    /// Group to preview/select next.
    pub fallback: GroupId,
    /// Faces that became unassigned.
    pub released: Vec<FaceId>,
    /// `(old, new)` ids of renumbered groups.
    pub renumbered: Vec<(GroupId, GroupId)>,
}
/// Partition of mesh faces into connected unfold groups over a shared topology.
///
/// Every face belongs to at most one group and every group's faces induce
/// a connected subgraph of the face adjacency graph. All mutations go through
/// [`add_face`](Self::add_face), [`remove_face`](Self::remove_face),
/// [`create_group`](Self::create_group), [`delete_group`](Self::delete_group)
/// and the import methods.
#[derive(Debug, Clone)]
pub struct GroupStore {
    topology: Rc<TopologyIndex>,
    groups: BTreeMap<GroupId, Group>,
    face_group: Vec<Option<GroupId>>,
    created: usize,
    active: GroupId,
}

impl GroupStore {
    /// Creates a store holding only the empty default group.
    #[must_use]
    pub fn new(topology: Rc<TopologyIndex>) -> Self {
        let face_group = vec![None; topology.face_count()];
        let mut store = Self {
            topology,
            groups: BTreeMap::new(),
            face_group,
            created: 0,
            active: GroupId::DEFAULT,
        };
        store.insert_group(GroupId::DEFAULT);
        store
    }

    /// The topology the partition is defined over.
    #[must_use]
    pub fn topology(&self) -> &Rc<TopologyIndex> {
        &self.topology
    }

    /// Rebinds to a topology with identical faces and adjacency, for example
    /// after world positions were refreshed.
    pub(crate) fn rebind(&mut self, topology: Rc<TopologyIndex>) {
        debug_assert_eq!(topology.face_count(), self.face_group.len());
        self.topology = topology;
    }

    /// Returns the group with the given id.
    ///
    /// # Errors
    ///
    /// Returns [`GroupError::GroupNotFound`] if the group does not exist.
    pub fn group(&self, id: GroupId) -> Result<&Group, GroupError> {
        self.groups.get(&id).ok_or(GroupError::GroupNotFound(id))
    }

    /// Iterates groups in id order.
    pub fn groups(&self) -> impl Iterator<Item = &Group> {
        self.groups.values()
    }

    /// Number of groups.
    #[must_use]
    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    /// Group of `face`, if assigned.
    #[must_use]
    pub fn group_of(&self, face: FaceId) -> Option<GroupId> {
        self.face_group.get(face.index()).copied().flatten()
    }

    /// Member faces of `group`; empty for unknown groups.
    #[must_use]
    pub fn faces_of(&self, group: GroupId) -> &[FaceId] {
        self.groups.get(&group).map(Group::faces).unwrap_or_default()
    }

    /// Group currently targeted by preview and selection.
    #[must_use]
    pub fn active_group(&self) -> GroupId {
        self.active
    }

    /// Sets the preview/selection target.
    ///
    /// # Errors
    ///
    /// Returns [`GroupError::GroupNotFound`] if the group does not exist.
    pub fn set_active_group(&mut self, id: GroupId) -> Result<(), GroupError> {
        self.group(id)?;
        self.active = id;
        Ok(())
    }

    /// Sets or clears a group's display name.
    ///
    /// # Errors
    ///
    /// Returns [`GroupError::GroupNotFound`] if the group does not exist.
    pub fn set_group_name(&mut self, id: GroupId, name: Option<String>) -> Result<(), GroupError> {
        self.group_mut(id)?.name = name;
        Ok(())
    }

    /// Sets or clears a group's layout rotation.
    ///
    /// # Errors
    ///
    /// Returns [`GroupError::GroupNotFound`] if the group does not exist.
    pub fn set_place_angle(&mut self, id: GroupId, angle: Option<f64>) -> Result<(), GroupError> {
        self.group_mut(id)?.place_angle = angle;
        Ok(())
    }

    /// Sets a group's display color.
    ///
    /// # Errors
    ///
    /// Returns [`GroupError::GroupNotFound`] if the group does not exist.
    pub fn set_group_color(&mut self, id: GroupId, color: Color) -> Result<(), GroupError> {
        self.group_mut(id)?.color = color;
        Ok(())
    }

    /// Returns `true` if removing `face` from `group` keeps the remaining
    /// members connected.
    ///
    /// Trivially `true` for groups with at most one member and for faces
    /// that are not members.
    #[must_use]
    pub fn can_remove_face(&self, group: GroupId, face: FaceId) -> bool {
        let Some(g) = self.groups.get(&group) else {
            return true;
        };
        if g.len() <= 1 || !g.contains(face) {
            return true;
        }
        let mut remaining = g.member_set();
        remaining.remove(&face);
        let Some(&start) = remaining.first() else {
            return true;
        };
        reachable_count(&self.topology, &remaining, start) == remaining.len()
    }

    /// Returns `true` if `face` has an adjacency neighbor in `group`.
    ///
    /// Empty (or not yet created) groups accept any face as a seed.
    #[must_use]
    pub fn share_edge_with_group(&self, face: FaceId, group: GroupId) -> bool {
        if self.groups.get(&group).map_or(true, Group::is_empty) {
            return true;
        }
        self.topology
            .neighbors(face)
            .iter()
            .any(|&n| self.group_of(n) == Some(group))
    }

    /// Moves `face` into `target`, creating `target` on first reference.
    ///
    /// Rejected without mutation if taking the face out of its current group
    /// would disconnect that group, or if a non-empty `target` has no member
    /// adjacent to `face`. Adding a face to its own group is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`GroupError::WouldDisconnectSource`], [`GroupError::NoSharedEdge`],
    /// [`GroupError::FaceOutOfRange`] or [`GroupError::GroupNotFound`] for id 0.
    pub fn add_face(&mut self, face: FaceId, target: GroupId) -> Result<Invalidation, GroupError> {
        if !self.topology.contains_face(face) {
            return Err(GroupError::FaceOutOfRange(face));
        }
        if target.0 == 0 {
            return Err(GroupError::GroupNotFound(target));
        }
        let source = self.group_of(face);
        if source == Some(target) {
            return Ok(Invalidation::default());
        }
        if let Some(source) = source {
            if !self.can_remove_face(source, face) {
                return Err(GroupError::WouldDisconnectSource {
                    face,
                    group: source,
                });
            }
        }
        if !self.share_edge_with_group(face, target) {
            return Err(GroupError::NoSharedEdge {
                face,
                group: target,
            });
        }

        if let Some(source) = source {
            self.detach(face, source);
        }
        if !self.groups.contains_key(&target) {
            self.insert_group(target);
        }
        let topology = Rc::clone(&self.topology);
        if let Some(g) = self.groups.get_mut(&target) {
            g.faces.push(face);
            g.rebuild_tree(&topology);
        }
        self.face_group[face.index()] = Some(target);

        Ok(Invalidation::of(source.into_iter().chain([target])))
    }

    /// Unassigns `face` from `group`.
    ///
    /// Always allowed for groups with at most two members; otherwise the
    /// remaining members must stay connected.
    ///
    /// # Errors
    ///
    /// Returns [`GroupError::WouldDisconnectGroup`], [`GroupError::FaceNotInGroup`]
    /// or [`GroupError::GroupNotFound`].
    pub fn remove_face(&mut self, face: FaceId, group: GroupId) -> Result<Invalidation, GroupError> {
        let g = self.group(group)?;
        if !g.contains(face) {
            return Err(GroupError::FaceNotInGroup { face, group });
        }
        if g.len() > 2 && !self.can_remove_face(group, face) {
            return Err(GroupError::WouldDisconnectGroup { face, group });
        }
        self.detach(face, group);
        Ok(Invalidation::of([group]))
    }

    /// Creates an empty group with the lowest unused positive id.
    pub fn create_group(&mut self) -> GroupId {
        let id = (1..)
            .map(GroupId)
            .find(|id| !self.groups.contains_key(id))
            .unwrap_or(GroupId::DEFAULT);
        self.insert_group(id);
        id
    }

    /// Deletes a group, unassigning its faces and shifting every higher
    /// group id down by one.
    ///
    /// The fallback target is `id - 1`, clamped to the remaining ids, and
    /// becomes the active group.
    ///
    /// # Errors
    ///
    /// Returns [`GroupError::LastGroup`] if `id` is the only group, or
    /// [`GroupError::GroupNotFound`].
    pub fn delete_group(&mut self, id: GroupId) -> Result<Deletion, GroupError> {
        self.group(id)?;
        if self.groups.len() <= 1 {
            return Err(GroupError::LastGroup);
        }
        let removed = self
            .groups
            .remove(&id)
            .ok_or(GroupError::GroupNotFound(id))?;
        for &face in &removed.faces {
            if let Some(slot) = self.face_group.get_mut(face.index()) {
                *slot = None;
            }
        }

        let higher: Vec<GroupId> = self.groups.range(id..).map(|(&k, _)| k).collect();
        let mut renumbered = Vec::with_capacity(higher.len());
        for old in higher {
            let Some(mut group) = self.groups.remove(&old) else {
                continue;
            };
            let new = GroupId(old.0 - 1);
            group.id = new;
            for &face in &group.faces {
                if let Some(slot) = self.face_group.get_mut(face.index()) {
                    *slot = Some(new);
                }
            }
            self.groups.insert(new, group);
            renumbered.push((old, new));
        }
        if !self.groups.contains_key(&GroupId::DEFAULT) {
            self.insert_group(GroupId::DEFAULT);
        }

        let max = self.groups.keys().next_back().copied().unwrap_or(GroupId::DEFAULT);
        let fallback = GroupId(id.0.saturating_sub(1).max(1)).min(max);
        self.active = fallback;
        tracing::debug!(group = %id, fallback = %fallback, "deleted group");

        Ok(Deletion {
            fallback,
            released: removed.faces,
            renumbered,
        })
    }

    /// Replaces the whole partition with `records` without validation.
    ///
    /// The records are trusted: connectivity and face uniqueness are not
    /// checked. Faces outside the topology are dropped. Group 1 is created
    /// empty if the list does not contain it.
    pub fn import_groups(&mut self, records: &[GroupRecord]) -> Invalidation {
        self.groups.clear();
        self.face_group.iter_mut().for_each(|slot| *slot = None);
        self.created = 0;

        for record in records {
            let mut group = Group::new(record.id, record.color);
            group.name.clone_from(&record.name);
            group.place_angle = record.place_angle;
            for &face in &record.faces {
                match self.face_group.get_mut(face.index()) {
                    Some(slot) => {
                        *slot = Some(record.id);
                        group.faces.push(face);
                    }
                    None => {
                        tracing::warn!(group = %record.id, face = %face, "dropping imported face outside topology");
                    }
                }
            }
            self.groups.insert(record.id, group);
            self.created += 1;
        }
        if !self.groups.contains_key(&GroupId::DEFAULT) {
            self.insert_group(GroupId::DEFAULT);
        }

        let topology = Rc::clone(&self.topology);
        for group in self.groups.values_mut() {
            group.rebuild_tree(&topology);
        }
        self.active = self.groups.keys().next().copied().unwrap_or(GroupId::DEFAULT);
        Invalidation::of(self.groups.keys().copied())
    }

    /// Validates `records` and, if they describe a proper partition, imports
    /// them. Nothing is mutated on failure.
    ///
    /// # Errors
    ///
    /// Returns the first [`ImportError`] found: zero or duplicate group ids,
    /// faces outside the topology, faces claimed twice, or groups that are
    /// not edge-connected.
    pub fn import_groups_checked(&mut self, records: &[GroupRecord]) -> Result<Invalidation, ImportError> {
        let mut owners: BTreeMap<FaceId, GroupId> = BTreeMap::new();
        let mut seen = BTreeSet::new();
        for record in records {
            if record.id.0 == 0 {
                return Err(ImportError::ZeroGroupId);
            }
            if !seen.insert(record.id) {
                return Err(ImportError::DuplicateGroup(record.id));
            }
            for &face in &record.faces {
                if !self.topology.contains_face(face) {
                    return Err(ImportError::FaceOutOfRange {
                        face,
                        group: record.id,
                    });
                }
                if let Some(&first) = owners.get(&face) {
                    return Err(ImportError::DuplicateFace {
                        face,
                        first,
                        second: record.id,
                    });
                }
                owners.insert(face, record.id);
            }
            let members: BTreeSet<FaceId> = record.faces.iter().copied().collect();
            if !is_connected(&self.topology, &members) {
                return Err(ImportError::Disconnected(record.id));
            }
        }
        Ok(self.import_groups(records))
    }

    /// Snapshot of the partition in its persisted shape, in id order.
    #[must_use]
    pub fn export_groups(&self) -> Vec<GroupRecord> {
        self.groups
            .values()
            .map(|g| GroupRecord {
                id: g.id,
                color: g.color,
                faces: g.faces.clone(),
                name: g.name.clone(),
                place_angle: g.place_angle,
            })
            .collect()
    }

    fn group_mut(&mut self, id: GroupId) -> Result<&mut Group, GroupError> {
        self.groups.get_mut(&id).ok_or(GroupError::GroupNotFound(id))
    }

    fn insert_group(&mut self, id: GroupId) {
        let color = palette_color(self.created);
        self.created += 1;
        self.groups.insert(id, Group::new(id, color));
    }

    fn detach(&mut self, face: FaceId, group: GroupId) {
        let topology = Rc::clone(&self.topology);
        if let Some(g) = self.groups.get_mut(&group) {
            g.faces.retain(|&f| f != face);
            g.rebuild_tree(&topology);
        }
        if let Some(slot) = self.face_group.get_mut(face.index()) {
            *slot = None;
        }
    }
}
