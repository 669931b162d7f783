use crate::dihedral::{DihedralCache, DihedralSource};
use crate::groups::GroupStore;
use crate::topology::{EdgeId, EdgeKind};

/// Fold/seam classification of a mesh edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeClass {
    /// Open mesh boundary; not an inter-face edge.
    Boundary,
    /// Stays joined when flattened: a parent/child pair in one group's tree.
    Fold,
    /// Cut line: every other inter-face edge.
    Seam,
}

/// Per-edge data consumed by tab generation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EdgeReport {
    /// The edge.
    pub edge: EdgeId,
    /// Fold/seam classification.
    pub class: EdgeClass,
    /// Signed dihedral angle in radians.
    pub dihedral: f64,
}

/// Classifies `edge` against the current partition.
///
/// Non-manifold edges are always seams. A manifold edge is a fold only if
/// both faces share a group and are parent and child in its spanning tree.
/// Unknown edges are reported as boundary.
#[must_use]
pub fn classify_edge(store: &GroupStore, edge: EdgeId) -> EdgeClass {
    let Ok(record) = store.topology().edge(edge) else {
        return EdgeClass::Boundary;
    };
    match record.kind() {
        EdgeKind::Boundary => EdgeClass::Boundary,
        EdgeKind::NonManifold => EdgeClass::Seam,
        EdgeKind::Manifold => {
            let (a, b) = (record.faces[0], record.faces[1]);
            match (store.group_of(a), store.group_of(b)) {
                (Some(ga), Some(gb)) if ga == gb => {
                    let folds = store
                        .group(ga)
                        .is_ok_and(|g| g.tree().is_parent_child(a, b));
                    if folds {
                        EdgeClass::Fold
                    } else {
                        EdgeClass::Seam
                    }
                }
                _ => EdgeClass::Seam,
            }
        }
    }
}

/// Returns `true` if `edge` is a seam.
#[must_use]
pub fn is_seam(store: &GroupStore, edge: EdgeId) -> bool {
    classify_edge(store, edge) == EdgeClass::Seam
}

/// Classification and dihedral angle of every edge, in edge id order.
pub fn edge_report<S: DihedralSource>(
    store: &GroupStore,
    angles: &mut DihedralCache<S>,
) -> Vec<EdgeReport> {
    store
        .topology()
        .edges()
        .map(|e| EdgeReport {
            edge: e.id,
            class: classify_edge(store, e.id),
            dihedral: angles.angle(e.id),
        })
        .collect()
}
