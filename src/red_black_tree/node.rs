use crate::links::Links;

/// The color of a node in a red-black tree.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Color {
    Red,
    Black,
}

/// Link record embedded in every entry of an `RbTree`.
///
/// A detached link has no relations and is red, the color every entry is linked with.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RbLink<H> {
    pub(crate) left: Option<H>,
    pub(crate) right: Option<H>,
    pub(crate) parent: Option<H>,
    pub(crate) color: Color,
}

impl<H> RbLink<H> {
    pub fn new() -> Self {
        RbLink {
            left: None,
            right: None,
            parent: None,
            color: Color::Red,
        }
    }

    pub fn color(&self) -> Color {
        self.color
    }

    pub fn is_red(&self) -> bool {
        self.color == Color::Red
    }

    /// Returns `true` if the link has no relations. A resident root with no children is also
    /// detached by this measure.
    pub fn is_detached(&self) -> bool {
        self.left.is_none() && self.right.is_none() && self.parent.is_none()
    }
}

impl<H> Default for RbLink<H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H: Copy> Links<H> for RbLink<H> {
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
