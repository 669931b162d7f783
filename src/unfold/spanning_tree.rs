use std::collections::HashMap;

use crate::topology::{FaceId, TopologyIndex};

/// Parent-pointer tree covering the faces of one unfold group.
///
/// Parent/child pairs are the group's fold edges. Faces are stored in
/// attachment order, so every parent precedes its children.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SpanningTree {
    parents: HashMap<FaceId, Option<FaceId>>,
    order: Vec<FaceId>,
}

impl SpanningTree {
    /// Builds a tree over `faces` using the adjacency of `topology`.
    ///
    /// The first face is the root. Each pass attaches every face that is
    /// adjacent to an attached face, choosing the most recently attached
    /// neighbor as parent. A pass that attaches nothing means the face set
    /// is disconnected; one remaining face is then hung off the root so the
    /// build always terminates.
    #[must_use]
    pub fn build(faces: &[FaceId], topology: &TopologyIndex) -> Self {
        let mut tree = Self::default();
        let Some((&root, rest)) = faces.split_first() else {
            return tree;
        };
        let mut attach_index: HashMap<FaceId, usize> = HashMap::new();
        tree.attach(root, None, &mut attach_index);

        let mut remaining: Vec<FaceId> = rest.to_vec();
        while !remaining.is_empty() {
            let mut unattached = Vec::with_capacity(remaining.len());
            let mut progress = false;
            for face in remaining {
                if attach_index.contains_key(&face) {
                    continue;
                }
                let parent = topology
                    .neighbors(face)
                    .iter()
                    .filter_map(|n| attach_index.get(n).copied())
                    .max()
                    .map(|i| tree.order[i]);
                match parent {
                    Some(parent) => {
                        tree.attach(face, Some(parent), &mut attach_index);
                        progress = true;
                    }
                    None => unattached.push(face),
                }
            }
            if !progress && !unattached.is_empty() {
                let forced = unattached.remove(0);
                tracing::warn!(
                    face = %forced,
                    root = %root,
                    "face set is disconnected, attaching face to root"
                );
                tree.attach(forced, Some(root), &mut attach_index);
            }
            remaining = unattached;
        }
        tree
    }

    fn attach(&mut self, face: FaceId, parent: Option<FaceId>, index: &mut HashMap<FaceId, usize>) {
        index.insert(face, self.order.len());
        self.parents.insert(face, parent);
        self.order.push(face);
    }

    /// Number of faces in the tree.
    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Returns `true` if the tree covers no faces.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Returns `true` if `face` is covered by the tree.
    #[must_use]
    pub fn contains(&self, face: FaceId) -> bool {
        self.parents.contains_key(&face)
    }

    /// Parent of `face`; `None` for roots and faces outside the tree.
    #[must_use]
    pub fn parent(&self, face: FaceId) -> Option<FaceId> {
        self.parents.get(&face).copied().flatten()
    }

    /// Returns `true` if `face` is a root of the tree.
    #[must_use]
    pub fn is_root(&self, face: FaceId) -> bool {
        matches!(self.parents.get(&face), Some(None))
    }

    /// Faces without a parent, in attachment order.
    pub fn roots(&self) -> impl Iterator<Item = FaceId> + '_ {
        self.order.iter().copied().filter(|&f| self.is_root(f))
    }

    /// Children of `face`, in attachment order.
    #[must_use]
    pub fn children(&self, face: FaceId) -> Vec<FaceId> {
        self.order
            .iter()
            .copied()
            .filter(|&f| self.parent(f) == Some(face))
            .collect()
    }

    /// Returns `true` if one face is the parent of the other.
    #[must_use]
    pub fn is_parent_child(&self, a: FaceId, b: FaceId) -> bool {
        self.parent(a) == Some(b) || self.parent(b) == Some(a)
    }

    /// Faces in attachment order; parents always precede their children.
    #[must_use]
    pub fn attach_order(&self) -> &[FaceId] {
        &self.order
    }

    /// Ancestors of `face`, nearest first, ending at its root.
    pub fn ancestors(&self, face: FaceId) -> impl Iterator<Item = FaceId> + '_ {
        std::iter::successors(self.parent(face), move |&f| self.parent(f))
    }

    /// Number of edges between `face` and its root.
    #[must_use]
    pub fn depth(&self, face: FaceId) -> usize {
        self.ancestors(face).count()
    }
}
