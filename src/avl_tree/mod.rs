//! Intrusive AVL tree where the heights of the two child subtrees of any node differ by at most
//! one.
//!
//! Every link record stores the height of its subtree, so `height` is O(1) while `first` and
//! `last` walk the spine in O(log n).

mod debug;
mod node;
mod set;
mod tree;

pub use self::node::AvlLink;
pub use self::set::{AvlSet, AvlSetIntoIter, AvlSetIter};
pub use self::tree::AvlTree;
