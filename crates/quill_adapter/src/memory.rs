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

//! Headless implementations of [`Engine`], [`EngineFactory`] and [`Host`].
//!
//! The memory engine keeps a delta of plain and inline-formatted text
//! (`bold`, `italic`, `underline`, `strike`, `link`), renders it as one
//! `<p>` per line and converts simple markup back. Everything the adapter
//! does to these types is recorded so callers can inspect it, and engine
//! events can be fired by hand.

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{json, Map, Value};
use widestring::Utf16String;

use crate::engine::{
    Engine, EngineEvent, EngineFactory, EngineHandler, EngineOptions,
    EventName, ListenerId, Range, Source,
};
use crate::host::{ElementHandle, Host, RenderingContext};
use crate::Delta;

static HTML_TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<[^>]*>|[^<]+").unwrap());
static HTML_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^<(/?)([a-z][a-z0-9]*)([^>]*)>$").unwrap());
static HREF: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?i)href\s*=\s*"([^"]*)""#).unwrap());

/// Import namespaces the memory factory can register extensions under.
const EXTENSION_NAMESPACES: [&str; 5] =
    ["attributors/", "blots/", "formats/", "modules/", "themes/"];

pub struct MemoryEngine {
    container: ElementHandle,
    options: EngineOptions,
    ops: RefCell<Vec<Value>>,
    block_tag: Cell<&'static str>,
    enabled: Cell<bool>,
    placeholder: RefCell<String>,
    history: RefCell<Vec<Delta>>,
    selection: Cell<Option<Range>>,
    listeners: RefCell<Vec<(EventName, ListenerId, EngineHandler)>>,
    next_listener: Cell<u64>,
}

impl fmt::Debug for MemoryEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryEngine")
            .field("container", &self.container)
            .field("ops", &self.ops.borrow())
            .field("enabled", &self.enabled.get())
            .field("listeners", &self.listener_count())
            .finish()
    }
}

impl Default for MemoryEngine {
    fn default() -> Self {
        Self::new(ElementHandle(0), EngineOptions::default())
    }
}

impl MemoryEngine {
    pub fn new(container: ElementHandle, options: EngineOptions) -> Self {
        Self {
            container,
            enabled: Cell::new(!options.read_only),
            placeholder: RefCell::new(options.placeholder.clone()),
            options,
            ops: RefCell::new(vec![json!({ "insert": "\n" })]),
            block_tag: Cell::new("p"),
            history: RefCell::new(Vec::new()),
            selection: Cell::new(None),
            listeners: RefCell::new(Vec::new()),
            next_listener: Cell::new(0),
        }
    }

    pub fn container(&self) -> &ElementHandle {
        &self.container
    }

    /// Element each line renders as in [`Engine::root_html`], `p` unless set.
    pub fn set_block_tag(&self, tag: &'static str) {
        self.block_tag.set(tag);
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.get()
    }

    pub fn placeholder(&self) -> String {
        self.placeholder.borrow().clone()
    }

    /// Number of undo snapshots.
    pub fn history_len(&self) -> usize {
        self.history.borrow().len()
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.borrow().len()
    }

    pub fn selection(&self) -> Option<Range> {
        self.selection.get()
    }

    /// The user types `text` at the end of the document.
    pub fn type_text(&self, text: &str) {
        let mut ops = self.ops.borrow().clone();
        let retain = utf16_len(&Delta::from_ops(ops.clone()).plain_text())
            .saturating_sub(1);
        if let Some(last) = ops.last_mut() {
            if last.get("attributes").is_none() {
                if let Some(s) = last.get("insert").and_then(Value::as_str) {
                    let trimmed = s.strip_suffix('\n').unwrap_or(s).to_owned();
                    last["insert"] = Value::String(trimmed);
                }
            }
        }
        ops.push(json!({ "insert": text }));
        let change = Delta::from_ops(vec![
            json!({ "retain": retain }),
            json!({ "insert": text }),
        ]);
        self.replace_ops(normalize(ops), Source::User, change);
    }

    /// The user deletes the whole document.
    pub fn delete_all(&self) {
        let len = utf16_len(&self.get_text()).saturating_sub(1);
        let change = Delta::from_ops(vec![json!({ "delete": len })]);
        self.replace_ops(vec![json!({ "insert": "\n" })], Source::User, change);
    }

    /// The user moves the selection. `None` means focus was lost.
    pub fn select(&self, range: Option<Range>) {
        let old_range = self.selection.replace(range);
        self.emit(&EngineEvent::SelectionChange {
            range,
            old_range,
            source: Source::User,
        });
    }

    /// Deliver `event` to every listener attached for it.
    pub fn emit(&self, event: &EngineEvent) {
        let name = event.name();
        let handlers: Vec<EngineHandler> = self
            .listeners
            .borrow()
            .iter()
            .filter(|(n, _, _)| *n == name)
            .map(|(_, _, handler)| handler.clone())
            .collect();
        for handler in handlers {
            handler(event);
        }
    }

    fn replace_ops(&self, ops: Vec<Value>, source: Source, change: Delta) {
        let old_delta = self.get_contents();
        self.history.borrow_mut().push(old_delta.clone());
        *self.ops.borrow_mut() = ops;
        if source != Source::Silent {
            self.emit(&EngineEvent::TextChange {
                delta: change,
                old_delta,
                source,
            });
        }
    }
}

impl Engine for MemoryEngine {
    fn get_text(&self) -> String {
        self.get_contents().plain_text()
    }

    fn get_contents(&self) -> Delta {
        Delta::from_ops(self.ops.borrow().clone())
    }

    fn set_contents(&self, delta: &Delta, source: Source) {
        let ops = normalize(delta.ops().to_vec());
        self.replace_ops(ops, source, delta.clone());
    }

    fn set_text(&self, text: &str, source: Source) {
        let ops = normalize(vec![json!({ "insert": text })]);
        self.replace_ops(ops, source, Delta::from_text(text));
    }

    fn convert_html(&self, html: &str) -> Delta {
        Delta::from_ops(html_to_ops(html))
    }

    fn root_html(&self) -> String {
        ops_to_html(&self.ops.borrow(), self.block_tag.get())
    }

    fn enable(&self, enabled: bool) {
        self.enabled.set(enabled);
    }

    fn set_placeholder(&self, placeholder: &str) {
        *self.placeholder.borrow_mut() = placeholder.to_owned();
    }

    fn clear_history(&self) {
        self.history.borrow_mut().clear();
    }

    fn on(&self, event: EventName, handler: EngineHandler) -> ListenerId {
        let id = ListenerId(self.next_listener.get());
        self.next_listener.set(id.0 + 1);
        self.listeners.borrow_mut().push((event, id, handler));
        id
    }

    fn off(&self, event: EventName, listener: ListenerId) -> bool {
        let mut listeners = self.listeners.borrow_mut();
        let before = listeners.len();
        listeners.retain(|(n, id, _)| !(*n == event && *id == listener));
        listeners.len() != before
    }
}

fn utf16_len(text: &str) -> usize {
    Utf16String::from_str(text).len()
}

/// Append a text insert, merging it into the previous insert when both
/// carry the same attributes.
fn push_insert(ops: &mut Vec<Value>, text: &str, attributes: Option<&Value>) {
    if text.is_empty() {
        return;
    }
    if let Some(last) = ops.last_mut() {
        if last.get("attributes") == attributes {
            if let Some(prev) = last.get("insert").and_then(Value::as_str) {
                let merged = format!("{prev}{text}");
                last["insert"] = Value::String(merged);
                return;
            }
        }
    }
    let mut op = Map::new();
    op.insert("insert".to_owned(), Value::String(text.to_owned()));
    if let Some(attributes) = attributes {
        op.insert("attributes".to_owned(), attributes.clone());
    }
    ops.push(Value::Object(op));
}

/// Merge adjacent inserts and make sure the document ends in a newline.
fn normalize(ops: Vec<Value>) -> Vec<Value> {
    let mut out = Vec::with_capacity(ops.len());
    for op in ops {
        match op.get("insert").and_then(Value::as_str) {
            Some(text) => push_insert(&mut out, text, op.get("attributes")),
            None if op.get("insert").is_some() => out.push(op),
            None => {}
        }
    }
    let ends_with_newline = out
        .last()
        .and_then(|op| op.get("insert"))
        .and_then(Value::as_str)
        .is_some_and(|text| text.ends_with('\n'));
    if !ends_with_newline {
        push_insert(&mut out, "\n", None);
    }
    out
}

#[derive(Clone, Default)]
struct InlineFormat {
    bold: bool,
    italic: bool,
    underline: bool,
    strike: bool,
    link: Option<String>,
}

impl InlineFormat {
    fn attributes(&self) -> Option<Value> {
        let mut map = Map::new();
        for (name, on) in [
            ("bold", self.bold),
            ("italic", self.italic),
            ("underline", self.underline),
            ("strike", self.strike),
        ] {
            if on {
                map.insert(name.to_owned(), Value::Bool(true));
            }
        }
        if let Some(link) = &self.link {
            map.insert("link".to_owned(), Value::String(link.clone()));
        }
        (!map.is_empty()).then_some(Value::Object(map))
    }
}

fn html_to_ops(html: &str) -> Vec<Value> {
    let mut ops = Vec::new();
    let mut format = InlineFormat::default();
    let mut line_has_content = false;

    for token in HTML_TOKEN.find_iter(html) {
        let token = token.as_str();
        let Some(tag) = HTML_TAG.captures(token) else {
            let text = html_escape::decode_html_entities(token);
            push_insert(&mut ops, &text, format.attributes().as_ref());
            line_has_content = true;
            continue;
        };
        let closing = !tag[1].is_empty();
        match tag[2].to_ascii_lowercase().as_str() {
            "strong" | "b" => format.bold = !closing,
            "em" | "i" => format.italic = !closing,
            "u" => format.underline = !closing,
            "s" | "strike" | "del" => format.strike = !closing,
            "a" => {
                format.link = if closing {
                    None
                } else {
                    HREF.captures(&tag[3]).map(|href| {
                        html_escape::decode_html_entities(&href[1]).into_owned()
                    })
                }
            }
            "p" | "div" | "li" | "h1" | "h2" | "h3" | "blockquote" | "pre" => {
                if closing {
                    push_insert(&mut ops, "\n", None);
                    line_has_content = false;
                }
            }
            // A lone <br> is how an empty line is rendered.
            "br" if line_has_content => {
                push_insert(&mut ops, "\n", None);
                line_has_content = false;
            }
            _ => {}
        }
    }
    ops
}

fn ops_to_html(ops: &[Value], tag: &str) -> String {
    let mut html = String::new();
    let mut line = String::new();
    for op in ops {
        let Some(text) = op.get("insert").and_then(Value::as_str) else {
            continue;
        };
        for (i, part) in text.split('\n').enumerate() {
            if i > 0 {
                flush_line(&mut html, &mut line, tag);
            }
            if !part.is_empty() {
                line.push_str(&render_run(part, op.get("attributes")));
            }
        }
    }
    if !line.is_empty() {
        flush_line(&mut html, &mut line, tag);
    }
    html
}

fn flush_line(html: &mut String, line: &mut String, tag: &str) {
    let body = if line.is_empty() { "<br>" } else { line.as_str() };
    html.push_str(&format!("<{tag}>{body}</{tag}>"));
    line.clear();
}

fn render_run(text: &str, attributes: Option<&Value>) -> String {
    let flag = |name: &str| {
        attributes
            .and_then(|a| a.get(name))
            .and_then(Value::as_bool)
            .unwrap_or(false)
    };
    let mut run = html_escape::encode_text(text).into_owned();
    for (name, tag) in
        [("strike", "s"), ("underline", "u"), ("italic", "em"), ("bold", "strong")]
    {
        if flag(name) {
            run = format!("<{tag}>{run}</{tag}>");
        }
    }
    if let Some(link) = attributes
        .and_then(|a| a.get("link"))
        .and_then(Value::as_str)
    {
        let href = html_escape::encode_double_quoted_attribute(link);
        run = format!(r#"<a href="{href}">{run}</a>"#);
    }
    run
}

/// Creates [`MemoryEngine`]s and remembers what it was asked to do.
#[derive(Debug)]
pub struct MemoryEngineFactory {
    name: String,
    created: AtomicUsize,
    last_options: Mutex<Option<EngineOptions>>,
    registrations: Mutex<BTreeMap<String, Vec<String>>>,
}

impl MemoryEngineFactory {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            created: AtomicUsize::new(0),
            last_options: Mutex::new(None),
            registrations: Mutex::new(BTreeMap::new()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn created_count(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }

    /// Options of the most recently created engine.
    pub fn last_options(&self) -> Option<EngineOptions> {
        self.last_options
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Registered extensions by import path, with their whitelists.
    pub fn registrations(&self) -> BTreeMap<String, Vec<String>> {
        self.registrations
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Default for MemoryEngineFactory {
    fn default() -> Self {
        Self::new("memory")
    }
}

impl EngineFactory for MemoryEngineFactory {
    type Engine = MemoryEngine;

    fn create(
        &self,
        container: &ElementHandle,
        options: EngineOptions,
    ) -> MemoryEngine {
        self.created.fetch_add(1, Ordering::SeqCst);
        *self
            .last_options
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(options.clone());
        MemoryEngine::new(container.clone(), options)
    }

    fn register_extension(
        &self,
        import_path: &str,
        whitelist: &[String],
    ) -> bool {
        if !EXTENSION_NAMESPACES
            .iter()
            .any(|ns| import_path.starts_with(ns))
        {
            return false;
        }
        self.registrations
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(import_path.to_owned(), whitelist.to_vec());
        true
    }
}

/// A host element tree held in memory.
pub struct MemoryHost {
    context: RenderingContext,
    toolbar: Option<ElementHandle>,
    next_element: Cell<u64>,
    mounted: RefCell<Vec<ElementHandle>>,
    styles: RefCell<Vec<(ElementHandle, String, String)>>,
    attributes: RefCell<BTreeMap<String, String>>,
    zone_depth: Cell<usize>,
    zone_entries: Cell<usize>,
}

impl MemoryHost {
    pub fn new() -> Self {
        Self::with_context(RenderingContext::Interactive)
    }

    /// A host rendering on the server.
    pub fn server() -> Self {
        Self::with_context(RenderingContext::Server)
    }

    pub fn with_context(context: RenderingContext) -> Self {
        Self {
            context,
            toolbar: None,
            next_element: Cell::new(1),
            mounted: RefCell::new(Vec::new()),
            styles: RefCell::new(Vec::new()),
            attributes: RefCell::new(BTreeMap::new()),
            zone_depth: Cell::new(0),
            zone_entries: Cell::new(0),
        }
    }

    /// Project a toolbar element into the host markup.
    pub fn with_toolbar(mut self) -> Self {
        self.toolbar = Some(self.allocate());
        self
    }

    pub fn mounted(&self) -> Vec<ElementHandle> {
        self.mounted.borrow().clone()
    }

    pub fn styles(&self) -> Vec<(ElementHandle, String, String)> {
        self.styles.borrow().clone()
    }

    pub fn attribute(&self, name: &str) -> Option<String> {
        self.attributes.borrow().get(name).cloned()
    }

    /// Whether code is currently running inside [`Host::run_in_zone`].
    pub fn in_zone(&self) -> bool {
        self.zone_depth.get() > 0
    }

    pub fn zone_entries(&self) -> usize {
        self.zone_entries.get()
    }

    fn allocate(&self) -> ElementHandle {
        let id = self.next_element.get();
        self.next_element.set(id + 1);
        ElementHandle(id)
    }
}

impl Default for MemoryHost {
    fn default() -> Self {
        Self::new()
    }
}

impl Host for MemoryHost {
    fn rendering_context(&self) -> RenderingContext {
        self.context
    }

    fn run_in_zone(&self, task: &mut dyn FnMut()) {
        self.zone_entries.set(self.zone_entries.get() + 1);
        self.zone_depth.set(self.zone_depth.get() + 1);
        task();
        self.zone_depth.set(self.zone_depth.get() - 1);
    }

    fn mount_container(&self) -> ElementHandle {
        let element = self.allocate();
        self.mounted.borrow_mut().push(element.clone());
        element
    }

    fn toolbar_slot(&self) -> Option<ElementHandle> {
        self.toolbar.clone()
    }

    fn set_style(&self, element: &ElementHandle, property: &str, value: &str) {
        self.styles.borrow_mut().push((
            element.clone(),
            property.to_owned(),
            value.to_owned(),
        ));
    }

    fn set_attribute(&self, name: &str, value: &str) {
        self.attributes
            .borrow_mut()
            .insert(name.to_owned(), value.to_owned());
    }

    fn remove_attribute(&self, name: &str) {
        self.attributes.borrow_mut().remove(name);
    }
}
