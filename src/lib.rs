//! Intrusive red-black and AVL tree engines.
//!
//! The trees never allocate and never own their entries. Each entry embeds a link record
//! (`RbLink<H>` or `AvlLink<H>`) and lives in caller-owned storage addressed by a copyable handle
//! `H`, such as a `Vec<E>` indexed by `usize` or an `arena::TypedArena<E>` indexed by
//! `arena::Handle`. Every operation takes the storage explicitly.
//!
//! Insertion is split in two: `insert_check` looks up the key and either reports the resident
//! duplicate or returns a `CommitContext`, and `insert_commit` links a prepared entry into that
//! slot. Callers can skip building an entry when the key is already present.
//!
//! `RedBlackSet` and `AvlSet` are owning ordered sets built on the engines.
//!
//! # Examples
//!
//! ```
//! use intrusive_bst::order::KeyExtractor;
//! use intrusive_bst::{InsertCheck, Linked, RbLink, RbTree};
//!
//! struct Timer {
//!     deadline: u64,
//!     link: RbLink<usize>,
//! }
//!
//! impl Linked<RbLink<usize>> for Timer {
//!     fn link(&self) -> &RbLink<usize> {
//!         &self.link
//!     }
//!
//!     fn link_mut(&mut self) -> &mut RbLink<usize> {
//!         &mut self.link
//!     }
//! }
//!
//! struct ByDeadline;
//!
//! impl KeyExtractor<Timer> for ByDeadline {
//!     type Key = u64;
//!
//!     fn key(timer: &Timer) -> &u64 {
//!         &timer.deadline
//!     }
//! }
//!
//! let mut timers: Vec<Timer> = Vec::new();
//! let mut tree: RbTree<usize, ByDeadline> = RbTree::new();
//!
//! for deadline in &[30, 10, 20] {
//!     if let InsertCheck::Vacant(context) = tree.insert_check(&timers, deadline) {
//!         timers.push(Timer { deadline: *deadline, link: RbLink::new() });
//!         let timer = timers.len() - 1;
//!         tree.insert_commit(&mut timers, context, timer);
//!     }
//! }
//!
//! let expired: Vec<u64> = tree.iter(&timers).map(|timer| timers[timer].deadline).collect();
//! assert_eq!(expired, vec![10, 20, 30]);
//! assert!(tree.verify_invariants(&timers).is_ok());
//! ```

pub mod arena;
pub mod avl_tree;
mod commit;
mod error;
mod links;
pub mod order;
mod print;
pub mod red_black_tree;

pub use crate::avl_tree::{AvlLink, AvlSet, AvlTree};
pub use crate::commit::{CommitContext, InsertCheck};
pub use crate::error::InvariantViolation;
pub use crate::links::{Iter, Linked, Links, Side};
pub use crate::red_black_tree::{Color, RbLink, RbTree, RedBlackSet};
