use crate::arena::{Handle, TypedArena};
use crate::avl_tree::node::AvlLink;
use crate::avl_tree::tree::AvlTree;
use crate::commit::InsertCheck;
use crate::links::{self, Iter, Linked};
use crate::order::{ByBorrow, ByKey, Keyed, NaturalOrder};
use std::borrow::Borrow;
use std::mem;

struct Entry<T> {
    key: T,
    link: AvlLink<Handle>,
}

impl<T> Keyed for Entry<T> {
    type Key = T;

    fn key(&self) -> &T {
        &self.key
    }
}

impl<T> Linked<AvlLink<Handle>> for Entry<T> {
    fn link(&self) -> &AvlLink<Handle> {
        &self.link
    }

    fn link_mut(&mut self) -> &mut AvlLink<Handle> {
        &mut self.link
    }
}

/// An ordered set implemented using an AVL tree.
///
/// An AVL tree is a self-balancing binary search tree that maintains the invariant that the
/// heights of two child subtrees of any node differ by at most one. Keys live in an arena and are
/// linked through an intrusive `AvlTree`; the minimum and maximum are found by walking a spine.
///
/// # Examples
///
/// ```
/// use intrusive_bst::AvlSet;
///
/// let mut set = AvlSet::new();
/// set.insert(12);
/// set.insert(4);
/// set.insert(9);
///
/// assert_eq!(set.floor(&10), Some(&9));
/// assert_eq!(set.max(), Some(&12));
/// assert_eq!(set.remove(&4), Some(4));
/// assert_eq!(set.iter().collect::<Vec<&i32>>(), vec![&9, &12]);
/// ```
pub struct AvlSet<T> {
    tree: AvlTree<Handle, ByKey>,
    arena: TypedArena<Entry<T>>,
}

impl<T> AvlSet<T> {
    pub fn new() -> Self {
        AvlSet {
            tree: AvlTree::new(),
            arena: TypedArena::new(1024),
        }
    }

    /// Inserts a key into the set. If an equal key already exists, it is replaced and returned.
    pub fn insert(&mut self, key: T) -> Option<T>
    where
        T: Ord,
    {
        match self.tree.insert_check(&self.arena, &key) {
            InsertCheck::Occupied(node) => Some(mem::replace(&mut self.arena[node].key, key)),
            InsertCheck::Vacant(context) => {
                let node = self.arena.allocate(Entry {
                    key,
                    link: AvlLink::new(),
                });
                self.tree.insert_commit(&mut self.arena, context, node);
                None
            },
        }
    }

    /// Removes a key from the set and returns it, or `None` if it is absent.
    pub fn remove<V>(&mut self, key: &V) -> Option<T>
    where
        T: Borrow<V>,
        V: Ord + ?Sized,
    {
        let node = self.find(key)?;
        self.tree.remove_node(&mut self.arena, node);
        Some(self.arena.free(&node).key)
    }

    fn find<V>(&self, key: &V) -> Option<Handle>
    where
        T: Borrow<V>,
        V: Ord + ?Sized,
    {
        links::search::<AvlLink<Handle>, Handle, _, ByBorrow<V>, NaturalOrder>(
            self.tree.root(),
            &self.arena,
            key,
        )
    }

    pub fn contains<V>(&self, key: &V) -> bool
    where
        T: Borrow<V>,
        V: Ord + ?Sized,
    {
        self.find(key).is_some()
    }

    pub fn len(&self) -> usize {
        self.tree.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }

    /// Clears the set, releasing every entry back to the arena.
    pub fn clear(&mut self) {
        self.tree.teardown(&mut self.arena, |arena, node| {
            arena.free(&node);
        });
    }

    /// Returns the greatest key that is less than or equal to `key`.
    pub fn floor<V>(&self, key: &V) -> Option<&T>
    where
        T: Borrow<V>,
        V: Ord + ?Sized,
    {
        links::floor::<AvlLink<Handle>, Handle, _, ByBorrow<V>, NaturalOrder>(
            self.tree.root(),
            &self.arena,
            key,
        )
        .map(|node| &self.arena[node].key)
    }

    /// Returns the least key that is greater than or equal to `key`.
    pub fn ceil<V>(&self, key: &V) -> Option<&T>
    where
        T: Borrow<V>,
        V: Ord + ?Sized,
    {
        links::ceil::<AvlLink<Handle>, Handle, _, ByBorrow<V>, NaturalOrder>(
            self.tree.root(),
            &self.arena,
            key,
        )
        .map(|node| &self.arena[node].key)
    }

    pub fn min(&self) -> Option<&T> {
        self.tree.first(&self.arena).map(|node| &self.arena[node].key)
    }

    pub fn max(&self) -> Option<&T> {
        self.tree.last(&self.arena).map(|node| &self.arena[node].key)
    }

    /// Returns an iterator over the set. The iterator yields keys in-order from either end.
    pub fn iter(&self) -> AvlSetIter<'_, T> {
        AvlSetIter {
            arena: &self.arena,
            tree_iter: self.tree.iter(&self.arena),
        }
    }
}

impl<T> IntoIterator for AvlSet<T> {
    type IntoIter = AvlSetIntoIter<T>;
    type Item = T;

    fn into_iter(self) -> Self::IntoIter {
        Self::IntoIter { set: self }
    }
}

impl<'a, T> IntoIterator for &'a AvlSet<T>
where
    T: 'a,
{
    type IntoIter = AvlSetIter<'a, T>;
    type Item = &'a T;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// An owning iterator for `AvlSet<T>`.
///
/// Each step unlinks the current minimum and moves its key out of the arena.
pub struct AvlSetIntoIter<T> {
    set: AvlSet<T>,
}

impl<T> Iterator for AvlSetIntoIter<T> {
    type Item = T;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.set.tree.first(&self.set.arena)?;
        self.set.tree.remove_node(&mut self.set.arena, node);
        Some(self.set.arena.free(&node).key)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.set.len(), Some(self.set.len()))
    }
}

/// An iterator for `AvlSet<T>` that yields immutable references in-order.
pub struct AvlSetIter<'a, T> {
    arena: &'a TypedArena<Entry<T>>,
    tree_iter: Iter<'a, AvlLink<Handle>, Handle, TypedArena<Entry<T>>>,
}

impl<'a, T> Iterator for AvlSetIter<'a, T>
where
    T: 'a,
{
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        let arena = self.arena;
        self.tree_iter.next().map(|node| &arena[node].key)
    }
}

impl<'a, T> DoubleEndedIterator for AvlSetIter<'a, T>
where
    T: 'a,
{
    fn next_back(&mut self) -> Option<Self::Item> {
        let arena = self.arena;
        self.tree_iter.next_back().map(|node| &arena[node].key)
    }
}

impl<T> Default for AvlSet<T> {
    fn default() -> Self {
        Self::new()
    }
}
