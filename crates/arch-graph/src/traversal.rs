//! Early-exit iteration and document tree walking

use crate::node::Node;

/// Cooperative stop signal handed to every [`for_each`] callback
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Trigger {
    /// Set to stop the iteration after the current element
    pub stop: bool,
}

/// Visit `items` in order until the callback sets `trigger.stop`.
///
/// No element after the one that raised the signal is visited. Empty input is
/// a no-op.
pub fn for_each<I, F>(items: I, mut func: F)
where
    I: IntoIterator,
    F: FnMut(I::Item, &mut Trigger),
{
    let mut trigger = Trigger::default();
    for item in items {
        func(item, &mut trigger);
        if trigger.stop {
            break;
        }
    }
}

/// Trait for traversing a document tree
pub trait Traversal {
    /// Visit a node
    fn visit(&mut self, node: &Node, path: &[String]);

    /// Called when entering a node with children
    fn enter(&mut self, _node: &Node, _path: &[String]) {}

    /// Called when leaving a node with children
    fn leave(&mut self, _node: &Node, _path: &[String]) {}

    /// Returns true if traversal should continue
    fn should_continue(&self) -> bool {
        true
    }
}

/// Walk the tree depth-first using a visitor
pub fn walk<T: Traversal>(node: &Node, visitor: &mut T) {
    walk_recursive(node, visitor, &mut vec![]);
}

fn walk_recursive<T: Traversal>(node: &Node, visitor: &mut T, path: &mut Vec<String>) {
    if !visitor.should_continue() {
        return;
    }

    visitor.visit(node, path);

    if !node.children.is_empty() {
        visitor.enter(node, path);
        path.push(node.name.clone());

        for child in &node.children {
            walk_recursive(child, visitor, path);
        }

        path.pop();
        visitor.leave(node, path);
    }
}
