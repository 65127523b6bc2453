//! The power tree: structural editing with validated edges, and the
//! evaluation that follows every change.
pub mod edge;
pub mod error;
pub mod tree;


pub use edge::Edge;
pub use error::{EdgeError, TreeError};
pub use tree::PowerTree;
