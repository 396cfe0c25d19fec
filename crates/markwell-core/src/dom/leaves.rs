use super::{Dom, NodeId};

/// Text-bearing leaves of a subtree, in document order.
///
/// Traversal state is an explicit stack owned by the iterator, so a clone is
/// an independent restart point and the tree itself is never touched.
#[derive(Debug, Clone)]
pub struct TextLeaves<'a> {
    dom: &'a Dom,
    stack: Vec<NodeId>,
}

impl<'a> TextLeaves<'a> {
    pub(crate) fn new(dom: &'a Dom, root: NodeId) -> Self {
        Self {
            dom,
            stack: vec![root],
        }
    }
}

impl<'a> Iterator for TextLeaves<'a> {
    type Item = (NodeId, &'a str);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(node) = self.stack.pop() {
            if let Some(text) = self.dom.text(node) {
                return Some((node, text));
            }
            self.stack
                .extend(self.dom.children(node).iter().rev().copied());
        }
        None
    }
}

/// Every node of a subtree in document order, the root first.
#[derive(Debug, Clone)]
pub struct Descendants<'a> {
    dom: &'a Dom,
    stack: Vec<NodeId>,
}

impl<'a> Descendants<'a> {
    pub(crate) fn new(dom: &'a Dom, root: NodeId) -> Self {
        let stack = if dom.exists(root) { vec![root] } else { vec![] };
        Self { dom, stack }
    }
}

impl Iterator for Descendants<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.stack
            .extend(self.dom.children(node).iter().rev().copied());
        Some(node)
    }
}

#[cfg(test)]
mod tests {
    use crate::dom::html::parse_fragment;

    #[test]
    fn test_leaves_in_document_order() {
        let dom = parse_fragment("<p>a<em>b<strong>c</strong></em>d</p><p>e</p>");
        let texts: Vec<_> = dom.text_leaves(dom.root()).map(|(_, t)| t).collect();
        assert_eq!(texts, ["a", "b", "c", "d", "e"]);
    }

    #[test]
    fn test_leaves_restart_from_clone() {
        let dom = parse_fragment("<p>one<br>two</p>");
        let mut leaves = dom.text_leaves(dom.root());
        let restart = leaves.clone();
        assert_eq!(leaves.next().map(|(_, t)| t), Some("one"));
        assert_eq!(leaves.next().map(|(_, t)| t), Some("two"));
        assert_eq!(leaves.next(), None);
        assert_eq!(restart.count(), 2);
    }

    #[test]
    fn test_descendants_preorder() {
        let dom = parse_fragment("<ul><li>a</li><li><em>b</em></li></ul>");
        let tags: Vec<String> = dom
            .descendants(dom.root())
            .skip(1)
            .map(|n| match dom.tag(n) {
                Some(tag) => tag.to_string(),
                None => dom.text(n).unwrap_or_default().to_string(),
            })
            .collect();
        assert_eq!(tags, ["ul", "li", "a", "li", "em", "b"]);
    }
}
