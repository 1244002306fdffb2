//! HTML serialization of the arena DOM through html5ever's serializer.
//!
//! [`SerializableNode`] walks the arena and feeds html5ever's
//! `HtmlSerializer`, which owns the HTML5 rules (void elements, raw-text
//! parents, escaping).

use std::io;

use html5ever::serialize::{Serialize, SerializeOpts, Serializer, TraversalScope, serialize};

use super::arena::{Dom, NodeData, NodeId};

/// Elements whose first newline is dropped by the parser, so one leading
/// newline in their text must be written twice to survive a round trip.
const NEWLINE_EATING_ELEMENTS: &[&str] = &["pre", "textarea", "listing"];

/// A node of a [`Dom`] that html5ever can serialize.
#[derive(Clone, Copy)]
pub struct SerializableNode<'a> {
    dom: &'a Dom,
    node: NodeId,
}

impl<'a> SerializableNode<'a> {
    pub fn new(dom: &'a Dom, node: NodeId) -> Self {
        Self { dom, node }
    }

    fn write_node<S: Serializer>(&self, serializer: &mut S, id: NodeId) -> io::Result<()> {
        let Some(node) = self.dom.get(id) else {
            return Ok(());
        };

        match &node.data {
            NodeData::Document => self.write_children(serializer, id),
            NodeData::Doctype { name } => serializer.write_doctype(name),
            NodeData::Comment(text) => serializer.write_comment(text),
            NodeData::Text(text) => serializer.write_text(text),
            NodeData::Element { name, attrs } => {
                serializer.start_elem(
                    name.clone(),
                    attrs.iter().map(|attr| (&attr.name, attr.value.as_str())),
                )?;
                if self.leading_newline_needs_doubling(id) {
                    serializer.write_text("\n")?;
                }
                self.write_children(serializer, id)?;
                serializer.end_elem(name.clone())
            }
        }
    }

    fn write_children<S: Serializer>(&self, serializer: &mut S, id: NodeId) -> io::Result<()> {
        for child in self.dom.children(id) {
            self.write_node(serializer, child)?;
        }
        Ok(())
    }

    fn leading_newline_needs_doubling(&self, id: NodeId) -> bool {
        let is_newline_eater = self
            .dom
            .element_name(id)
            .is_some_and(|name| NEWLINE_EATING_ELEMENTS.contains(&name.as_ref()));
        is_newline_eater
            && self
                .dom
                .children(id)
                .next()
                .and_then(|first| self.dom.text(first))
                .is_some_and(|text| text.starts_with('\n'))
    }
}

impl Serialize for SerializableNode<'_> {
    fn serialize<S>(&self, serializer: &mut S, traversal_scope: TraversalScope) -> io::Result<()>
    where
        S: Serializer,
    {
        match traversal_scope {
            TraversalScope::IncludeNode => self.write_node(serializer, self.node),
            TraversalScope::ChildrenOnly(_) => self.write_children(serializer, self.node),
        }
    }
}

fn to_html(dom: &Dom, node: NodeId, traversal_scope: TraversalScope) -> String {
    let mut bytes = Vec::new();
    let opts = SerializeOpts {
        traversal_scope,
        ..Default::default()
    };

    if let Err(e) = serialize(&mut bytes, &SerializableNode::new(dom, node), opts) {
        tracing::warn!(error = %e, "html serialization failed");
    }

    String::from_utf8(bytes).unwrap_or_default()
}

/// Serialize the whole document.
pub fn serialize_document(dom: &Dom) -> String {
    to_html(dom, dom.document(), TraversalScope::ChildrenOnly(None))
}

/// Serialize a node including its own tags (`outerHTML`).
pub fn serialize_node(dom: &Dom, node: NodeId) -> String {
    to_html(dom, node, TraversalScope::IncludeNode)
}
