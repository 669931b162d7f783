use std::collections::{BTreeSet, VecDeque};

use crate::topology::{FaceId, TopologyIndex};

/// Number of members reachable from `start` through adjacency edges that
/// stay inside `members`.
#[must_use]
pub fn reachable_count(topology: &TopologyIndex, members: &BTreeSet<FaceId>, start: FaceId) -> usize {
    if !members.contains(&start) {
        return 0;
    }
    let mut seen = BTreeSet::from([start]);
    let mut queue = VecDeque::from([start]);
    while let Some(face) = queue.pop_front() {
        for &n in topology.neighbors(face) {
            if members.contains(&n) && seen.insert(n) {
                queue.push_back(n);
            }
        }
    }
    seen.len()
}

/// Returns `true` if `members` induces a connected subgraph of the face
/// adjacency graph. Empty sets are connected.
#[must_use]
pub fn is_connected(topology: &TopologyIndex, members: &BTreeSet<FaceId>) -> bool {
    match members.first() {
        Some(&start) => reachable_count(topology, members, start) == members.len(),
        None => true,
    }
}
