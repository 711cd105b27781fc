// Copyright 2026 The Matrix.org Foundation C.I.C.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.


//! HTML fragments parsed with html5ever and written back out through a
//! filter.

use std::borrow::Cow;
use std::cell::{Ref, RefCell};

use html5ever::tendril::{StrTendril, TendrilSink};
use html5ever::tree_builder::{ElementFlags, NodeOrText, QuirksMode, TreeSink};
use html5ever::{parse_fragment, Attribute, LocalName, Namespace, QualName};

pub(crate) const HTML_NAMESPACE: &str = "http://www.w3.org/1999/xhtml";

const VOID_ELEMENTS: [&str; 14] = [
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link",
    "meta", "param", "source", "track", "wbr",
];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct NodeId(usize);

#[derive(Debug)]
enum NodeKind {
    Document,
    Element {
        name: QualName,
        attrs: Vec<Attribute>,
        template_contents: Option<NodeId>,
    },
    Text(String),
    /// Comments, processing instructions and template contents. Never
    /// written out.
    Other,
}

#[derive(Debug)]
struct Node {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// What to do with an element when writing a fragment.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Verdict {
    Keep,
    /// Leave out the tag but write its children.
    Unwrap,
    /// Leave out the element and everything inside it.
    Drop,
}

pub(crate) trait FragmentFilter {
    fn element(&self, name: &QualName) -> Verdict;

    /// Whether `attr` is written on a kept element.
    fn attribute(&self, element: &QualName, attr: &Attribute) -> bool;
}

/// A parsed fragment. Nodes live in one list and refer to each other by
/// index.
#[derive(Debug)]
pub(crate) struct Fragment {
    nodes: Vec<Node>,
    unnamed: QualName,
}

impl Fragment {
    /// Parse `html` the way a browser parses the inner markup of a `<body>`.
    pub(crate) fn parse(html: &str) -> Self {
        let context =
            QualName::new(None, Namespace::from(HTML_NAMESPACE), LocalName::from("body"));
        parse_fragment(FragmentSink::default(), Default::default(), context, vec![])
            .from_utf8()
            .one(html.as_bytes())
    }

    /// Serialize the fragment. Elements and attributes whose names are
    /// not plain ASCII names are never written, whatever `filter` says.
    pub(crate) fn write(&self, filter: &dyn FragmentFilter) -> String {
        let mut out = String::new();
        for node in self.top_level() {
            self.write_node(node, filter, &mut out);
        }
        out
    }

    fn top_level(&self) -> Vec<NodeId> {
        let mut top = Vec::new();
        for &child in &self.nodes[0].children {
            match &self.nodes[child.0].kind {
                NodeKind::Element { name, .. } if &*name.local == "html" => {
                    top.extend_from_slice(&self.nodes[child.0].children)
                }
                _ => top.push(child),
            }
        }
        top
    }

    fn write_node(&self, id: NodeId, filter: &dyn FragmentFilter, out: &mut String) {
        match &self.nodes[id.0].kind {
            NodeKind::Text(text) => out.push_str(&html_escape::encode_text(text)),
            NodeKind::Element { name, attrs, .. } => {
                let verdict = if is_plain_name(&name.local) {
                    filter.element(name)
                } else {
                    Verdict::Unwrap
                };
                match verdict {
                    Verdict::Drop => {}
                    Verdict::Unwrap => self.write_children(id, filter, out),
                    Verdict::Keep => {
                        let tag: &str = &name.local;
                        out.push('<');
                        out.push_str(tag);
                        for attr in attrs.iter().filter(|attr| {
                            is_plain_name(&attr.name.local) && filter.attribute(name, attr)
                        }) {
                            out.push(' ');
                            out.push_str(&attr.name.local);
                            out.push_str("=\"");
                            out.push_str(&html_escape::encode_double_quoted_attribute(
                                &*attr.value,
                            ));
                            out.push('"');
                        }
                        out.push('>');
                        if !VOID_ELEMENTS.contains(&tag) {
                            self.write_children(id, filter, out);
                            out.push_str("</");
                            out.push_str(tag);
                            out.push('>');
                        }
                    }
                }
            }
            NodeKind::Document | NodeKind::Other => {}
        }
    }

    fn write_children(&self, id: NodeId, filter: &dyn FragmentFilter, out: &mut String) {
        for &child in &self.nodes[id.0].children {
            self.write_node(child, filter, out);
        }
    }

    fn add(&mut self, kind: NodeKind) -> NodeId {
        self.nodes.push(Node {
            kind,
            parent: None,
            children: Vec::new(),
        });
        NodeId(self.nodes.len() - 1)
    }

    fn name(&self, id: NodeId) -> &QualName {
        match &self.nodes[id.0].kind {
            NodeKind::Element { name, .. } => name,
            _ => &self.unnamed,
        }
    }

    fn detach(&mut self, id: NodeId) {
        if let Some(parent) = self.nodes[id.0].parent.take() {
            self.nodes[parent.0].children.retain(|child| *child != id);
        }
    }

    fn append(&mut self, parent: NodeId, child: NodeOrText<NodeId>) {
        let node = match child {
            NodeOrText::AppendNode(node) => {
                self.detach(node);
                node
            }
            NodeOrText::AppendText(text) => {
                if let Some(&last) = self.nodes[parent.0].children.last() {
                    if let NodeKind::Text(existing) = &mut self.nodes[last.0].kind {
                        existing.push_str(&text);
                        return;
                    }
                }
                self.add(NodeKind::Text(text.to_string()))
            }
        };
        self.nodes[node.0].parent = Some(parent);
        self.nodes[parent.0].children.push(node);
    }

    fn insert_before(&mut self, sibling: NodeId, child: NodeOrText<NodeId>) {
        let Some(parent) = self.nodes[sibling.0].parent else {
            return;
        };
        let node = match child {
            NodeOrText::AppendNode(node) => {
                self.detach(node);
                node
            }
            NodeOrText::AppendText(text) => {
                let index = self.position(parent, sibling);
                if index > 0 {
                    let previous = self.nodes[parent.0].children[index - 1];
                    if let NodeKind::Text(existing) = &mut self.nodes[previous.0].kind {
                        existing.push_str(&text);
                        return;
                    }
                }
                self.add(NodeKind::Text(text.to_string()))
            }
        };
        let index = self.position(parent, sibling);
        self.nodes[node.0].parent = Some(parent);
        self.nodes[parent.0].children.insert(index, node);
    }

    fn position(&self, parent: NodeId, child: NodeId) -> usize {
        self.nodes[parent.0]
            .children
            .iter()
            .position(|c| *c == child)
            .unwrap_or(0)
    }
}

impl Default for Fragment {
    fn default() -> Self {
        Self {
            nodes: vec![Node {
                kind: NodeKind::Document,
                parent: None,
                children: Vec::new(),
            }],
            unnamed: QualName::new(None, Namespace::from(""), LocalName::from("")),
        }
    }
}

fn is_plain_name(name: &str) -> bool {
    let mut chars = name.chars();
    chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == ':')
}

#[derive(Default)]
struct FragmentSink {
    fragment: RefCell<Fragment>,
}

impl TreeSink for FragmentSink {
    type Handle = NodeId;
    type Output = Fragment;
    type ElemName<'a> = Ref<'a, QualName>;

    fn finish(self) -> Self::Output {
        self.fragment.into_inner()
    }

    fn parse_error(&self, msg: Cow<'static, str>) {
        log::trace!(target: "quill_adapter::sanitize", "HTML parse error: {msg}");
    }

    fn get_document(&self) -> Self::Handle {
        NodeId(0)
    }

    fn elem_name<'a>(&'a self, target: &'a Self::Handle) -> Self::ElemName<'a> {
        Ref::map(self.fragment.borrow(), |fragment| fragment.name(*target))
    }

    fn create_element(
        &self,
        name: QualName,
        attrs: Vec<Attribute>,
        flags: ElementFlags,
    ) -> Self::Handle {
        let mut fragment = self.fragment.borrow_mut();
        let template_contents = if flags.template {
            Some(fragment.add(NodeKind::Other))
        } else {
            None
        };
        fragment.add(NodeKind::Element {
            name,
            attrs,
            template_contents,
        })
    }

    fn create_comment(&self, _text: StrTendril) -> Self::Handle {
        self.fragment.borrow_mut().add(NodeKind::Other)
    }

    fn create_pi(&self, _target: StrTendril, _data: StrTendril) -> Self::Handle {
        self.fragment.borrow_mut().add(NodeKind::Other)
    }

    fn append(&self, parent: &Self::Handle, child: NodeOrText<Self::Handle>) {
        self.fragment.borrow_mut().append(*parent, child);
    }

    fn append_based_on_parent_node(
        &self,
        element: &Self::Handle,
        prev_element: &Self::Handle,
        child: NodeOrText<Self::Handle>,
    ) {
        let mut fragment = self.fragment.borrow_mut();
        if fragment.nodes[element.0].parent.is_some() {
            fragment.insert_before(*element, child);
        } else {
            fragment.append(*prev_element, child);
        }
    }

    fn append_doctype_to_document(
        &self,
        _name: StrTendril,
        _public_id: StrTendril,
        _system_id: StrTendril,
    ) {
    }

    fn get_template_contents(&self, target: &Self::Handle) -> Self::Handle {
        match &self.fragment.borrow().nodes[target.0].kind {
            NodeKind::Element {
                template_contents: Some(contents),
                ..
            } => *contents,
            _ => *target,
        }
    }

    fn same_node(&self, x: &Self::Handle, y: &Self::Handle) -> bool {
        x == y
    }

    fn set_quirks_mode(&self, _mode: QuirksMode) {}

    fn append_before_sibling(
        &self,
        sibling: &Self::Handle,
        new_node: NodeOrText<Self::Handle>,
    ) {
        self.fragment.borrow_mut().insert_before(*sibling, new_node);
    }

    fn add_attrs_if_missing(&self, target: &Self::Handle, attrs: Vec<Attribute>) {
        let mut fragment = self.fragment.borrow_mut();
        if let NodeKind::Element {
            attrs: existing, ..
        } = &mut fragment.nodes[target.0].kind
        {
            for attr in attrs {
                if !existing.iter().any(|e| e.name == attr.name) {
                    existing.push(attr);
                }
            }
        }
    }

    fn remove_from_parent(&self, target: &Self::Handle) {
        self.fragment.borrow_mut().detach(*target);
    }

    fn reparent_children(&self, node: &Self::Handle, new_parent: &Self::Handle) {
        let mut fragment = self.fragment.borrow_mut();
        let children = std::mem::take(&mut fragment.nodes[node.0].children);
        for child in &children {
            fragment.nodes[child.0].parent = Some(*new_parent);
        }
        fragment.nodes[new_parent.0].children.extend(children);
    }
}

#[cfg(test)]
mod test {
    use super::*;

    struct KeepAll;

    impl FragmentFilter for KeepAll {
        fn element(&self, _name: &QualName) -> Verdict {
            Verdict::Keep
        }

        fn attribute(&self, _element: &QualName, _attr: &Attribute) -> bool {
            true
        }
    }

    fn roundtrip(html: &str) -> String {
        Fragment::parse(html).write(&KeepAll)
    }

    #[test]
    fn simple_markup_is_written_back() {
        assert_eq!(
            roundtrip(r#"<p>a <strong>b</strong> <a href="x">c</a></p>"#),
            r#"<p>a <strong>b</strong> <a href="x">c</a></p>"#
        );
    }

    #[test]
    fn unclosed_elements_are_closed() {
        assert_eq!(roundtrip("<p><em>x"), "<p><em>x</em></p>");
    }

    #[test]
    fn void_elements_have_no_end_tag() {
        assert_eq!(roundtrip("<p>a<br>b</p>"), "<p>a<br>b</p>");
    }

    #[test]
    fn text_and_attributes_are_escaped() {
        assert_eq!(
            roundtrip(r#"<a title="&quot;q&quot;">1 &lt; 2 &amp; 3</a>"#),
            r#"<a title="&quot;q&quot;">1 &lt; 2 &amp; 3</a>"#
        );
    }

    #[test]
    fn comments_are_never_written() {
        assert_eq!(roundtrip("<p>a<!-- b --></p>"), "<p>a</p>");
    }

    #[test]
    fn odd_tag_names_are_unwrapped() {
        assert_eq!(roundtrip("<x<y>z</x<y>"), "z");
    }
}
