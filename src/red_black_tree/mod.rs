//! Intrusive red-black tree that uses a color bit per node to keep the tree approximately
//! balanced during insertions and deletions.
//!
//! The tree caches its minimum and maximum entries, so `first` and `last` are O(1).

mod debug;
mod node;
mod set;
mod tree;

pub use self::node::{Color, RbLink};
pub use self::set::{RedBlackSet, RedBlackSetIntoIter, RedBlackSetIter};
pub use self::tree::RbTree;
