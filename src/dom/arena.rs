//! Arena-based DOM for HTML documents.
//!
//! Nodes live in a contiguous vector and link to each other by index, so the
//! tree can be walked upward (parent, previous sibling) without reference
//! counting. The parent owns its children; upward links are plain indices.

use std::collections::HashMap;

use html5ever::{LocalName, QualName, ns};

/// Unique identifier for a node in the arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

impl NodeId {
    /// Sentinel value for no node.
    pub const NONE: NodeId = NodeId(u32::MAX);

    /// Check if this is a valid node ID.
    pub fn is_some(&self) -> bool {
        self.0 != u32::MAX
    }

    /// Check if this is the sentinel value.
    pub fn is_none(&self) -> bool {
        self.0 == u32::MAX
    }
}

/// Node type in the arena DOM.
#[derive(Debug, Clone)]
pub enum NodeData {
    /// Document root.
    Document,
    /// Element with name and attributes.
    Element {
        name: QualName,
        attrs: Vec<Attribute>,
    },
    /// Text content.
    Text(String),
    /// Comment.
    Comment(String),
    /// Document type declaration.
    Doctype { name: String },
}

/// HTML attribute.
#[derive(Debug, Clone)]
pub struct Attribute {
    pub name: QualName,
    pub value: String,
}

impl Attribute {
    /// Build an attribute in the null namespace.
    pub fn new(name: &str, value: impl Into<String>) -> Self {
        Self {
            name: QualName::new(None, ns!(), LocalName::from(name)),
            value: value.into(),
        }
    }
}

/// A node in the arena DOM.
#[derive(Debug)]
pub struct Node {
    pub data: NodeData,
    pub parent: NodeId,
    pub first_child: NodeId,
    pub last_child: NodeId,
    pub prev_sibling: NodeId,
    pub next_sibling: NodeId,
}

impl Node {
    fn new(data: NodeData) -> Self {
        Self {
            data,
            parent: NodeId::NONE,
            first_child: NodeId::NONE,
            last_child: NodeId::NONE,
            prev_sibling: NodeId::NONE,
            next_sibling: NodeId::NONE,
        }
    }
}

/// Arena-based DOM tree.
pub struct Dom {
    nodes: Vec<Node>,
    document: NodeId,
    /// Map from id attribute to node. Entries may go stale when a node is
    /// detached or renamed; lookups re-check before answering.
    id_map: HashMap<String, NodeId>,
}

impl Dom {
    /// Create a new empty DOM with a document root.
    pub fn new() -> Self {
        let mut dom = Self {
            nodes: Vec::new(),
            document: NodeId::NONE,
            id_map: HashMap::new(),
        };
        dom.document = dom.alloc(Node::new(NodeData::Document));
        dom
    }

    fn alloc(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(node);
        id
    }

    /// Get the document root ID.
    pub fn document(&self) -> NodeId {
        self.document
    }

    /// Get a node by ID.
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        if id.is_none() {
            return None;
        }
        self.nodes.get(id.0 as usize)
    }

    /// Get a mutable node by ID.
    fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        if id.is_none() {
            return None;
        }
        self.nodes.get_mut(id.0 as usize)
    }

    /// Create a new element node.
    pub fn create_element(&mut self, name: QualName, attrs: Vec<Attribute>) -> NodeId {
        let id_attr = attrs
            .iter()
            .find(|a| a.name.local.as_ref() == "id")
            .map(|a| a.value.clone());

        let node_id = self.alloc(Node::new(NodeData::Element { name, attrs }));

        // First element with a given id wins, as in browsers.
        if let Some(id_str) = id_attr {
            self.id_map.entry(id_str).or_insert(node_id);
        }

        node_id
    }

    /// Create an HTML element by tag name.
    pub fn create_html_element(&mut self, tag: &str, attrs: Vec<Attribute>) -> NodeId {
        self.create_element(QualName::new(None, ns!(html), LocalName::from(tag)), attrs)
    }

    /// Create a new text node.
    pub fn create_text(&mut self, text: String) -> NodeId {
        self.alloc(Node::new(NodeData::Text(text)))
    }

    /// Create a new comment node.
    pub fn create_comment(&mut self, text: String) -> NodeId {
        self.alloc(Node::new(NodeData::Comment(text)))
    }

    /// Create a doctype node.
    pub fn create_doctype(&mut self, name: String) -> NodeId {
        self.alloc(Node::new(NodeData::Doctype { name }))
    }

    /// Append a child to a parent node.
    pub fn append(&mut self, parent: NodeId, child: NodeId) {
        let last_child = self.get(parent).map(|n| n.last_child).unwrap_or(NodeId::NONE);

        if let Some(child_node) = self.get_mut(child) {
            child_node.parent = parent;
            child_node.prev_sibling = last_child;
            child_node.next_sibling = NodeId::NONE;
        }

        if let Some(last_node) = self.get_mut(last_child) {
            last_node.next_sibling = child;
        }

        if let Some(parent_node) = self.get_mut(parent) {
            if parent_node.first_child.is_none() {
                parent_node.first_child = child;
            }
            parent_node.last_child = child;
        }
    }

    /// Insert a node before a sibling.
    pub fn insert_before(&mut self, sibling: NodeId, new_node: NodeId) {
        let (parent, prev) = match self.get(sibling) {
            Some(n) => (n.parent, n.prev_sibling),
            None => return,
        };

        if let Some(new) = self.get_mut(new_node) {
            new.parent = parent;
            new.prev_sibling = prev;
            new.next_sibling = sibling;
        }

        if let Some(sib) = self.get_mut(sibling) {
            sib.prev_sibling = new_node;
        }

        if prev.is_some() {
            if let Some(p) = self.get_mut(prev) {
                p.next_sibling = new_node;
            }
        } else if let Some(par) = self.get_mut(parent) {
            par.first_child = new_node;
        }
    }

    /// Unlink a node from its parent. The node and its subtree stay in the
    /// arena but are no longer reachable from the document.
    pub fn detach(&mut self, target: NodeId) {
        let (parent, prev, next) = match self.get(target) {
            Some(n) => (n.parent, n.prev_sibling, n.next_sibling),
            None => return,
        };

        if prev.is_some() {
            if let Some(p) = self.get_mut(prev) {
                p.next_sibling = next;
            }
        } else if let Some(p) = self.get_mut(parent) {
            p.first_child = next;
        }

        if next.is_some() {
            if let Some(n) = self.get_mut(next) {
                n.prev_sibling = prev;
            }
        } else if let Some(p) = self.get_mut(parent) {
            p.last_child = prev;
        }

        if let Some(node) = self.get_mut(target) {
            node.parent = NodeId::NONE;
            node.prev_sibling = NodeId::NONE;
            node.next_sibling = NodeId::NONE;
        }
    }

    /// Append text to an existing text node, or create new if last child isn't text.
    pub fn append_text(&mut self, parent: NodeId, text: &str) {
        let last_child = self.get(parent).map(|n| n.last_child).unwrap_or(NodeId::NONE);

        if let Some(last) = self.get_mut(last_child)
            && let NodeData::Text(ref mut existing) = last.data
        {
            existing.push_str(text);
            return;
        }

        let text_node = self.create_text(text.to_string());
        self.append(parent, text_node);
    }

    /// Get the live element carrying the given id attribute.
    ///
    /// Returns `None` for ids whose element has since been detached or had
    /// its id changed, mirroring `document.getElementById`.
    pub fn get_by_id(&self, id: &str) -> Option<NodeId> {
        if id.is_empty() {
            return None;
        }
        // Every element that ever carried an id is registered, so a miss
        // means no element has it.
        let &node = self.id_map.get(id)?;
        if self.element_id(node) == Some(id) && self.is_attached(node) {
            return Some(node);
        }
        // Stale entry: fall back to a document-order scan.
        self.descendants(self.document)
            .find(|&n| self.element_id(n) == Some(id))
    }

    /// Check whether an id is already used by a live element.
    pub fn id_in_use(&self, id: &str) -> bool {
        self.get_by_id(id).is_some()
    }

    /// Check whether a node is reachable from the document root.
    pub fn is_attached(&self, id: NodeId) -> bool {
        let mut current = id;
        while let Some(node) = self.get(current) {
            if current == self.document {
                return true;
            }
            current = node.parent;
        }
        false
    }

    /// Get the number of nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Check if the DOM is empty (only has document root).
    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 1
    }

    /// Iterate over children of a node.
    pub fn children(&self, parent: NodeId) -> ChildrenIter<'_> {
        let first = self.get(parent).map(|n| n.first_child).unwrap_or(NodeId::NONE);
        ChildrenIter {
            dom: self,
            current: first,
        }
    }

    /// Iterate over all descendants of `root` in document order (pre-order),
    /// excluding `root` itself.
    pub fn descendants(&self, root: NodeId) -> Descendants<'_> {
        let first = self.get(root).map(|n| n.first_child).unwrap_or(NodeId::NONE);
        Descendants {
            dom: self,
            root,
            next: first,
        }
    }

    /// Parent of a node, `NONE` for the document and detached nodes.
    pub fn parent(&self, id: NodeId) -> NodeId {
        self.get(id).map(|n| n.parent).unwrap_or(NodeId::NONE)
    }

    /// Parent of a node if it is an element (never the document).
    pub fn parent_element(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.parent(id);
        self.is_element(parent).then_some(parent)
    }

    /// Nearest preceding sibling that is an element.
    pub fn prev_element_sibling(&self, id: NodeId) -> Option<NodeId> {
        let mut current = self.get(id)?.prev_sibling;
        while current.is_some() {
            if self.is_element(current) {
                return Some(current);
            }
            current = self.get(current)?.prev_sibling;
        }
        None
    }

    /// Find the first node matching a predicate (document order).
    pub fn find<F>(&self, predicate: F) -> Option<NodeId>
    where
        F: Fn(&Node) -> bool,
    {
        self.descendants(self.document)
            .find(|&id| self.get(id).is_some_and(&predicate))
    }

    /// Find element by tag name (first match).
    pub fn find_by_tag(&self, tag: &str) -> Option<NodeId> {
        self.find(|node| match &node.data {
            NodeData::Element { name, .. } => name.local.as_ref() == tag,
            _ => false,
        })
    }
}

impl Default for Dom {
    fn default() -> Self {
        Self::new()
    }
}

/// Iterator over children of a node.
pub struct ChildrenIter<'a> {
    dom: &'a Dom,
    current: NodeId,
}

impl Iterator for ChildrenIter<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        if self.current.is_none() {
            return None;
        }
        let id = self.current;
        self.current = self
            .dom
            .get(id)
            .map(|n| n.next_sibling)
            .unwrap_or(NodeId::NONE);
        Some(id)
    }
}

/// Pre-order iterator over a subtree.
pub struct Descendants<'a> {
    dom: &'a Dom,
    root: NodeId,
    next: NodeId,
}

impl Iterator for Descendants<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next;
        let node = self.dom.get(current)?;

        self.next = if node.first_child.is_some() {
            node.first_child
        } else {
            // Climb until a node with a next sibling, stopping at the root.
            let mut cursor = current;
            loop {
                if cursor == self.root || cursor.is_none() {
                    break NodeId::NONE;
                }
                let Some(n) = self.dom.get(cursor) else {
                    break NodeId::NONE;
                };
                if n.next_sibling.is_some() {
                    break n.next_sibling;
                }
                cursor = n.parent;
            }
        };

        Some(current)
    }
}

/// Convenience methods for element nodes.
impl Dom {
    /// Get element's local name (tag).
    pub fn element_name(&self, id: NodeId) -> Option<&LocalName> {
        self.get(id).and_then(|n| match &n.data {
            NodeData::Element { name, .. } => Some(&name.local),
            _ => None,
        })
    }

    /// Check an element's tag name.
    pub fn has_tag(&self, id: NodeId, tag: &str) -> bool {
        self.element_name(id).is_some_and(|n| n.as_ref() == tag)
    }

    /// Get an attribute value.
    pub fn get_attr(&self, id: NodeId, attr_name: &str) -> Option<&str> {
        self.get(id).and_then(|n| match &n.data {
            NodeData::Element { attrs, .. } => attrs
                .iter()
                .find(|a| a.name.local.as_ref() == attr_name)
                .map(|a| a.value.as_str()),
            _ => None,
        })
    }

    /// Set an attribute, replacing any existing value.
    pub fn set_attr(&mut self, id: NodeId, attr_name: &str, value: &str) {
        let Some(NodeData::Element { attrs, .. }) = self.get_mut(id).map(|n| &mut n.data) else {
            return;
        };

        match attrs.iter_mut().find(|a| a.name.local.as_ref() == attr_name) {
            Some(existing) => existing.value = value.to_string(),
            None => attrs.push(Attribute::new(attr_name, value)),
        }

        if attr_name == "id" && !self.id_in_use_by_other(value, id) {
            self.id_map.insert(value.to_string(), id);
        }
    }

    fn id_in_use_by_other(&self, value: &str, id: NodeId) -> bool {
        self.get_by_id(value).is_some_and(|other| other != id)
    }

    /// Remove an attribute. Returns the previous value, if any.
    pub fn remove_attr(&mut self, id: NodeId, attr_name: &str) -> Option<String> {
        let Some(NodeData::Element { attrs, .. }) = self.get_mut(id).map(|n| &mut n.data) else {
            return None;
        };
        let pos = attrs.iter().position(|a| a.name.local.as_ref() == attr_name)?;
        Some(attrs.remove(pos).value)
    }

    /// Get element's id attribute.
    pub fn element_id(&self, id: NodeId) -> Option<&str> {
        self.get_attr(id, "id").filter(|s| !s.is_empty())
    }

    /// Iterate over element's classes.
    pub fn classes(&self, id: NodeId) -> impl Iterator<Item = &str> {
        self.get_attr(id, "class")
            .unwrap_or_default()
            .split_ascii_whitespace()
    }

    /// Check whether an element carries a class.
    pub fn has_class(&self, id: NodeId, class: &str) -> bool {
        self.classes(id).any(|c| c == class)
    }

    /// Add a class unless already present. Returns `true` if it was added.
    pub fn add_class(&mut self, id: NodeId, class: &str) -> bool {
        if !self.is_element(id) || self.has_class(id, class) {
            return false;
        }
        let value = match self.get_attr(id, "class") {
            Some(existing) if !existing.trim().is_empty() => format!("{} {class}", existing.trim()),
            _ => class.to_string(),
        };
        self.set_attr(id, "class", &value);
        true
    }

    /// Remove a class. Drops the `class` attribute entirely when no classes
    /// remain. Returns `true` if the class was present.
    pub fn remove_class(&mut self, id: NodeId, class: &str) -> bool {
        if !self.has_class(id, class) {
            return false;
        }
        let remaining: Vec<String> = self
            .classes(id)
            .filter(|c| *c != class)
            .map(str::to_string)
            .collect();
        if remaining.is_empty() {
            self.remove_attr(id, "class");
        } else {
            self.set_attr(id, "class", &remaining.join(" "));
        }
        true
    }

    /// Check if node is an element.
    pub fn is_element(&self, id: NodeId) -> bool {
        self.get(id)
            .is_some_and(|n| matches!(n.data, NodeData::Element { .. }))
    }

    /// Check if node is a text node.
    pub fn is_text(&self, id: NodeId) -> bool {
        self.get(id).is_some_and(|n| matches!(n.data, NodeData::Text(_)))
    }

    /// Get text of a text node.
    pub fn text(&self, id: NodeId) -> Option<&str> {
        self.get(id).and_then(|n| match &n.data {
            NodeData::Text(s) => Some(s.as_str()),
            _ => None,
        })
    }

    /// Concatenated text of all descendant text nodes (`textContent`).
    pub fn text_content(&self, id: NodeId) -> String {
        if let Some(text) = self.text(id) {
            return text.to_string();
        }
        self.descendants(id)
            .filter_map(|n| self.text(n))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_elements() {
        let mut dom = Dom::new();

        let div = dom.create_html_element("div", vec![Attribute::new("id", "main")]);
        dom.append(dom.document(), div);

        assert_eq!(dom.element_name(div).unwrap().as_ref(), "div");
        assert_eq!(dom.element_id(div), Some("main"));
        assert_eq!(dom.get_by_id("main"), Some(div));
    }

    #[test]
    fn test_append_children() {
        let mut dom = Dom::new();

        let parent = dom.create_html_element("div", vec![]);
        let child1 = dom.create_html_element("p", vec![]);
        let child2 = dom.create_html_element("p", vec![]);

        dom.append(dom.document(), parent);
        dom.append(parent, child1);
        dom.append(parent, child2);

        let children: Vec<_> = dom.children(parent).collect();
        assert_eq!(children, vec![child1, child2]);
        assert_eq!(dom.prev_element_sibling(child2), Some(child1));
        assert_eq!(dom.prev_element_sibling(child1), None);
    }

    #[test]
    fn test_text_merging() {
        let mut dom = Dom::new();

        let p = dom.create_html_element("p", vec![]);
        dom.append(dom.document(), p);

        dom.append_text(p, "Hello, ");
        dom.append_text(p, "World!");

        let children: Vec<_> = dom.children(p).collect();
        assert_eq!(children.len(), 1);
        assert_eq!(dom.text(children[0]), Some("Hello, World!"));
    }

    #[test]
    fn test_descendants_document_order() {
        let mut dom = Dom::new();
        let body = dom.create_html_element("body", vec![]);
        let a = dom.create_html_element("section", vec![]);
        let a1 = dom.create_html_element("p", vec![]);
        let b = dom.create_html_element("section", vec![]);
        dom.append(dom.document(), body);
        dom.append(body, a);
        dom.append(a, a1);
        dom.append(body, b);

        let order: Vec<_> = dom.descendants(dom.document()).collect();
        assert_eq!(order, vec![body, a, a1, b]);

        // Subtree walk stops at its root.
        let inside_a: Vec<_> = dom.descendants(a).collect();
        assert_eq!(inside_a, vec![a1]);
    }

    #[test]
    fn test_detach_makes_id_unreachable() {
        let mut dom = Dom::new();
        let body = dom.create_html_element("body", vec![]);
        let p = dom.create_html_element("p", vec![Attribute::new("id", "gone")]);
        dom.append(dom.document(), body);
        dom.append(body, p);
        assert_eq!(dom.get_by_id("gone"), Some(p));

        dom.detach(p);
        assert_eq!(dom.get_by_id("gone"), None);
        assert_eq!(dom.children(body).count(), 0);
    }

    #[test]
    fn test_set_attr_registers_id() {
        let mut dom = Dom::new();
        let p = dom.create_html_element("p", vec![]);
        dom.append(dom.document(), p);

        dom.set_attr(p, "id", "para3");
        assert_eq!(dom.get_by_id("para3"), Some(p));

        dom.set_attr(p, "id", "renamed");
        assert_eq!(dom.get_by_id("para3"), None);
        assert_eq!(dom.get_by_id("renamed"), Some(p));
    }

    #[test]
    fn test_class_add_remove() {
        let mut dom = Dom::new();
        let p = dom.create_html_element("p", vec![Attribute::new("class", "lead")]);

        assert!(dom.add_class(p, "ref-highlight"));
        assert!(!dom.add_class(p, "ref-highlight"));
        assert_eq!(dom.get_attr(p, "class"), Some("lead ref-highlight"));

        assert!(dom.remove_class(p, "ref-highlight"));
        assert_eq!(dom.get_attr(p, "class"), Some("lead"));

        assert!(dom.remove_class(p, "lead"));
        assert_eq!(dom.get_attr(p, "class"), None);
    }

    #[test]
    fn test_text_content_recursive() {
        let mut dom = Dom::new();
        let h = dom.create_html_element("h2", vec![]);
        let em = dom.create_html_element("em", vec![]);
        dom.append_text(h, "Methods ");
        dom.append(h, em);
        dom.append_text(em, "and data");

        assert_eq!(dom.text_content(h), "Methods and data");
    }
}
