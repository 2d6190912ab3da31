//! Box-drawing renderer for tree shapes.

use crate::links::{LinkView, Links};
use std::fmt::{self, Write};

/// Writes the subtree under `root`, one node per line, right child above left child:
///
/// ```text
/// 4
/// ├── 6
/// │   ├── 7
/// │   └── 5
/// └── 2
///     └── 1
/// ```
pub(crate) fn render<L, H, S, W, F>(
    root: Option<H>,
    store: &S,
    out: &mut W,
    label: &mut F,
) -> fmt::Result
where
    L: Links<H>,
    H: Copy + Eq,
    S: LinkView<L, H> + ?Sized,
    W: Write,
    F: FnMut(&mut W, H) -> fmt::Result,
{
    match root {
        Some(root) => render_node::<L, H, S, W, F>(root, store, out, label, &mut String::new()),
        None => Ok(()),
    }
}

fn render_node<L, H, S, W, F>(
    node: H,
    store: &S,
    out: &mut W,
    label: &mut F,
    prefix: &mut String,
) -> fmt::Result
where
    L: Links<H>,
    H: Copy + Eq,
    S: LinkView<L, H> + ?Sized,
    W: Write,
    F: FnMut(&mut W, H) -> fmt::Result,
{
    label(out, node)?;
    out.write_char('\n')?;

    let link = store.link(node);
    let children = [link.right(), link.left()];
    let count = children.iter().filter(|child| child.is_some()).count();

    for (i, child) in children.iter().flatten().enumerate() {
        let is_last = i + 1 == count;
        out.write_str(prefix)?;
        out.write_str(if is_last { "└── " } else { "├── " })?;

        let len = prefix.len();
        prefix.push_str(if is_last { "    " } else { "│   " });
        render_node::<L, H, S, W, F>(*child, store, out, label, prefix)?;
        prefix.truncate(len);
    }
    Ok(())
}
