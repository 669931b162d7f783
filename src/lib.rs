pub mod dihedral;
pub mod document;
pub mod error;
pub mod groups;
pub mod math;
pub mod mesh;
pub mod topology;
pub mod unfold;

pub use document::UnfoldDocument;
pub use error::{PapercutError, Result};
