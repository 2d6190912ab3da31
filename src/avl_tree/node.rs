use crate::links::Links;

/// Link record embedded in every entry of an `AvlTree`.
///
/// `height` is the number of nodes on the longest downward path from this node. A detached link
/// has height 0; a resident leaf has height 1.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AvlLink<H> {
    pub(crate) left: Option<H>,
    pub(crate) right: Option<H>,
    pub(crate) parent: Option<H>,
    pub(crate) height: usize,
}

impl<H> AvlLink<H> {
    pub fn new() -> Self {
        AvlLink {
            left: None,
            right: None,
            parent: None,
            height: 0,
        }
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn is_detached(&self) -> bool {
        self.left.is_none() && self.right.is_none() && self.parent.is_none()
    }
}

impl<H> Default for AvlLink<H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H: Copy> Links<H> for AvlLink<H> {
    #[inline]
    fn left(&self) -> Option<H> {
        self.left
    }

    #[inline]
    fn right(&self) -> Option<H> {
        self.right
    }

    #[inline]
    fn parent(&self) -> Option<H> {
        self.parent
    }

    #[inline]
    fn set_left(&mut self, node: Option<H>) {
        self.left = node;
    }

    #[inline]
    fn set_right(&mut self, node: Option<H>) {
        self.right = node;
    }

    #[inline]
    fn set_parent(&mut self, node: Option<H>) {
        self.parent = node;
    }
}
