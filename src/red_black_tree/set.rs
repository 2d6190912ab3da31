use crate::arena::{Handle, TypedArena};
use crate::commit::InsertCheck;
use crate::links::{self, Iter, Linked};
use crate::order::{ByBorrow, ByKey, Keyed, NaturalOrder};
use crate::red_black_tree::node::RbLink;
use crate::red_black_tree::tree::RbTree;
use std::borrow::Borrow;
use std::mem;

struct Entry<T> {
    key: T,
    link: RbLink<Handle>,
}

impl<T> Keyed for Entry<T> {
    type Key = T;

    fn key(&self) -> &T {
        &self.key
    }
}

impl<T> Linked<RbLink<Handle>> for Entry<T> {
    fn link(&self) -> &RbLink<Handle> {
        &self.link
    }

    fn link_mut(&mut self) -> &mut RbLink<Handle> {
        &mut self.link
    }
}

/// An ordered set of owned keys stored in an arena and linked through an `RbTree`.
///
/// The cached bounds of the tree make `min` and `max` constant time. Lookups accept any borrowed
/// form of the key.
///
/// # Examples
///
/// ```
/// use intrusive_bst::RedBlackSet;
///
/// let mut set = RedBlackSet::new();
/// for word in &["pear", "fig", "apple"] {
///     set.insert(word.to_string());
/// }
///
/// assert!(set.contains("fig"));
/// assert_eq!(set.min().map(String::as_str), Some("apple"));
/// assert_eq!(set.ceil("g").map(String::as_str), Some("pear"));
/// assert_eq!(set.remove("fig"), Some(String::from("fig")));
/// assert_eq!(set.len(), 2);
/// ```
pub struct RedBlackSet<T> {
    tree: RbTree<Handle, ByKey>,
    arena: TypedArena<Entry<T>>,
}

impl<T> RedBlackSet<T> {
    pub fn new() -> Self {
        RedBlackSet {
            tree: RbTree::new(),
            arena: TypedArena::new(1024),
        }
    }

    /// Adds `key` to the set. An equal key already in the set is swapped out and returned, and
    /// its position in the tree is reused.
    ///
    /// # Examples
    ///
    /// ```
    /// use intrusive_bst::RedBlackSet;
    ///
    /// let mut set = RedBlackSet::new();
    /// assert_eq!(set.insert(4), None);
    /// assert_eq!(set.insert(4), Some(4));
    /// assert_eq!(set.len(), 1);
    /// ```
    pub fn insert(&mut self, key: T) -> Option<T>
    where
        T: Ord,
    {
        match self.tree.insert_check(&self.arena, &key) {
            InsertCheck::Occupied(node) => Some(mem::replace(&mut self.arena[node].key, key)),
            InsertCheck::Vacant(context) => {
                let node = self.arena.allocate(Entry {
                    key,
                    link: RbLink::new(),
                });
                self.tree.insert_commit(&mut self.arena, context, node);
                None
            },
        }
    }

    /// Takes the key equal to `key` out of the set, or returns `None` if there is none.
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
        links::search::<RbLink<Handle>, Handle, _, ByBorrow<V>, NaturalOrder>(
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

    /// Drops every key. The tree is dismantled bottom-up without recursion.
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
        links::floor::<RbLink<Handle>, Handle, _, ByBorrow<V>, NaturalOrder>(
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
        links::ceil::<RbLink<Handle>, Handle, _, ByBorrow<V>, NaturalOrder>(
            self.tree.root(),
            &self.arena,
            key,
        )
        .map(|node| &self.arena[node].key)
    }

    pub fn min(&self) -> Option<&T> {
        self.tree.first().map(|node| &self.arena[node].key)
    }

    pub fn max(&self) -> Option<&T> {
        self.tree.last().map(|node| &self.arena[node].key)
    }

    /// Returns a double-ended iterator over the keys in ascending order.
    ///
    /// # Examples
    ///
    /// ```
    /// use intrusive_bst::RedBlackSet;
    ///
    /// let mut set = RedBlackSet::new();
    /// for key in vec![3u8, 1, 2] {
    ///     set.insert(key);
    /// }
    ///
    /// assert_eq!(set.iter().rev().collect::<Vec<&u8>>(), vec![&3, &2, &1]);
    /// ```
    pub fn iter(&self) -> RedBlackSetIter<'_, T> {
        RedBlackSetIter {
            arena: &self.arena,
            tree_iter: self.tree.iter(&self.arena),
        }
    }
}

impl<T> IntoIterator for RedBlackSet<T> {
    type IntoIter = RedBlackSetIntoIter<T>;
    type Item = T;

    fn into_iter(self) -> Self::IntoIter {
        Self::IntoIter { set: self }
    }
}

impl<'a, T> IntoIterator for &'a RedBlackSet<T>
where
    T: 'a,
{
    type IntoIter = RedBlackSetIter<'a, T>;
    type Item = &'a T;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// An owning iterator for `RedBlackSet<T>` that yields keys in ascending order.
pub struct RedBlackSetIntoIter<T> {
    set: RedBlackSet<T>,
}

impl<T> Iterator for RedBlackSetIntoIter<T> {
    type Item = T;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.set.tree.first()?;
        self.set.tree.remove_node(&mut self.set.arena, node);
        Some(self.set.arena.free(&node).key)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.set.len(), Some(self.set.len()))
    }
}

/// A borrowing iterator for `RedBlackSet<T>`.
pub struct RedBlackSetIter<'a, T> {
    arena: &'a TypedArena<Entry<T>>,
    tree_iter: Iter<'a, RbLink<Handle>, Handle, TypedArena<Entry<T>>>,
}

impl<'a, T> Iterator for RedBlackSetIter<'a, T>
where
    T: 'a,
{
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        let arena = self.arena;
        self.tree_iter.next().map(|node| &arena[node].key)
    }
}

impl<'a, T> DoubleEndedIterator for RedBlackSetIter<'a, T>
where
    T: 'a,
{
    fn next_back(&mut self) -> Option<Self::Item> {
        let arena = self.arena;
        self.tree_iter.next_back().map(|node| &arena[node].key)
    }
}

impl<T> Default for RedBlackSet<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::RedBlackSet;

    fn set_of(keys: &[u32]) -> RedBlackSet<u32> {
        let mut set = RedBlackSet::default();
        for key in keys {
            set.insert(*key);
        }
        set
    }

    #[test]
    fn test_empty() {
        let set: RedBlackSet<u32> = RedBlackSet::new();
        assert!(set.is_empty());
        assert_eq!(set.min(), None);
        assert_eq!(set.max(), None);
        assert_eq!(set.iter().next(), None);
    }

    #[test]
    fn test_insert_replaces_equal_key() {
        let mut set = set_of(&[8, 2, 5]);
        assert_eq!(set.insert(5), Some(5));
        assert_eq!(set.len(), 3);
        set.tree.verify_invariants(&set.arena).unwrap();
    }

    #[test]
    fn test_remove_missing() {
        let mut set = set_of(&[8, 2, 5]);
        assert_eq!(set.remove(&3), None);
        assert_eq!(set.remove(&2), Some(2));
        assert_eq!(set.remove(&2), None);
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_min_max_follow_removals() {
        let mut set = set_of(&[4, 9, 1, 7]);
        assert_eq!((set.min(), set.max()), (Some(&1), Some(&9)));

        set.remove(&1);
        set.remove(&9);
        assert_eq!((set.min(), set.max()), (Some(&4), Some(&7)));
    }

    #[test]
    fn test_floor_ceil_between_keys() {
        let set = set_of(&[10, 20, 30]);
        let probes: [u32; 5] = [5, 10, 15, 30, 35];
        let floors: Vec<Option<&u32>> = probes.iter().map(|probe| set.floor(probe)).collect();
        let ceils: Vec<Option<&u32>> = probes.iter().map(|probe| set.ceil(probe)).collect();

        assert_eq!(floors, vec![None, Some(&10), Some(&10), Some(&30), Some(&30)]);
        assert_eq!(ceils, vec![Some(&10), Some(&10), Some(&20), Some(&30), None]);
    }

    #[test]
    fn test_borrowed_lookup() {
        let mut set = RedBlackSet::new();
        set.insert(String::from("b"));
        set.insert(String::from("a"));

        assert!(set.contains("a"));
        assert_eq!(set.floor("c").map(String::as_str), Some("b"));
        assert_eq!(set.remove("a"), Some(String::from("a")));
        assert!(!set.contains("a"));
    }

    #[test]
    fn test_clear_then_reuse() {
        let mut set = set_of(&(0..100).collect::<Vec<u32>>());
        set.clear();
        assert!(set.is_empty());
        assert!(set.arena.is_empty());

        set.insert(7);
        assert_eq!(set.iter().collect::<Vec<&u32>>(), vec![&7]);
    }

    #[test]
    fn test_into_iter_sorted() {
        let set = set_of(&[6, 3, 9, 1]);
        let iter = set.into_iter();
        assert_eq!(iter.size_hint(), (4, Some(4)));
        assert_eq!(iter.collect::<Vec<u32>>(), vec![1, 3, 6, 9]);
    }

    #[test]
    fn test_iter_from_both_ends() {
        let set = set_of(&[2, 4, 6]);
        let mut iter = (&set).into_iter();
        assert_eq!(iter.next_back(), Some(&6));
        assert_eq!(iter.next(), Some(&2));
        assert_eq!(iter.next_back(), Some(&4));
        assert_eq!(iter.next(), None);
    }
}
