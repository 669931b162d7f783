mod propagate;
mod seams;
mod spanning_tree;

pub use propagate::{flatten_normal, FlatFace, GroupLayout, UnfoldGroup};
pub use seams::{classify_edge, edge_report, is_seam, EdgeClass, EdgeReport};
pub use spanning_tree::SpanningTree;
