//! Ordering strategies injected into the trees as type parameters.
//!
//! Both engines are generic over a key extractor and a comparator. The strategies are plain types
//! with associated functions, so every comparison is monomorphized and no trait objects sit on
//! the search path.

use std::borrow::Borrow;
use std::cmp::Ordering;
use std::marker::PhantomData;

/// Three-way comparison between the key of a resident entry and a probe key.
///
/// `compare(candidate, key)` returns `Less` when the candidate orders before the key, in which
/// case a search continues in the right subtree.
pub trait Comparator<K: ?Sized> {
    fn compare(candidate: &K, key: &K) -> Ordering;
}

/// Orders keys by their `Ord` implementation.
#[derive(Clone, Copy, Debug, Default)]
pub struct NaturalOrder;

impl<K> Comparator<K> for NaturalOrder
where
    K: Ord + ?Sized,
{
    #[inline]
    fn compare(candidate: &K, key: &K) -> Ordering {
        candidate.cmp(key)
    }
}

/// Orders keys by the reverse of their `Ord` implementation.
#[derive(Clone, Copy, Debug, Default)]
pub struct Reverse;

impl<K> Comparator<K> for Reverse
where
    K: Ord + ?Sized,
{
    #[inline]
    fn compare(candidate: &K, key: &K) -> Ordering {
        key.cmp(candidate)
    }
}

/// Extracts the ordering key from an entry.
pub trait KeyExtractor<E: ?Sized> {
    type Key: ?Sized;

    fn key(entry: &E) -> &Self::Key;
}

/// An entry type that carries its own key.
///
/// # Examples
///
/// ```
/// use intrusive_bst::order::{ByKey, KeyExtractor, Keyed};
///
/// struct Order {
///     id: u64,
///     qty: u32,
/// }
///
/// impl Keyed for Order {
///     type Key = u64;
///
///     fn key(&self) -> &u64 {
///         &self.id
///     }
/// }
///
/// let order = Order { id: 7, qty: 100 };
/// assert_eq!(<ByKey as KeyExtractor<Order>>::key(&order), &7);
/// ```
pub trait Keyed {
    type Key: ?Sized;

    fn key(&self) -> &Self::Key;
}

/// Key extractor that defers to the entry's `Keyed` implementation.
#[derive(Clone, Copy, Debug, Default)]
pub struct ByKey;

impl<E> KeyExtractor<E> for ByKey
where
    E: Keyed + ?Sized,
{
    type Key = E::Key;

    #[inline]
    fn key(entry: &E) -> &Self::Key {
        entry.key()
    }
}

/// Key extractor that views the entry's `Keyed` key through `Borrow<V>`, so lookups can probe
/// with a borrowed form of the key such as `&str` for `String` keys.
pub struct ByBorrow<V: ?Sized>(PhantomData<fn(&V)>);

impl<E, V> KeyExtractor<E> for ByBorrow<V>
where
    E: Keyed + ?Sized,
    E::Key: Borrow<V>,
    V: ?Sized,
{
    type Key = V;

    #[inline]
    fn key(entry: &E) -> &V {
        entry.key().borrow()
    }
}
