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

//! The contract of the embedded rich text engine.
//!
//! The engine owns the authoritative document. The adapter only reads its
//! text, delta and rendered markup, replaces its content, toggles editing
//! and listens to its change and selection events.

use std::collections::BTreeSet;
use std::rc::Rc;

use serde_json::{Map, Value};
use strum_macros::{AsRefStr, Display, EnumString};

use crate::config::{Theme, DEFAULT_PLACEHOLDER};
use crate::host::ElementHandle;
use crate::Delta;

/// Who caused a content or selection change.
#[derive(Clone, Copy, Debug, PartialEq, Eq, AsRefStr, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum Source {
    Api,
    User,
    /// Writes made with this source emit no change event.
    Silent,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, AsRefStr, Display)]
pub enum EventName {
    #[strum(serialize = "text-change")]
    TextChange,
    #[strum(serialize = "selection-change")]
    SelectionChange,
}

/// A selection in UTF-16 code units.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Range {
    pub index: usize,
    pub length: usize,
}

#[derive(Clone, Debug, PartialEq)]
pub enum EngineEvent {
    TextChange {
        delta: Delta,
        old_delta: Delta,
        source: Source,
    },
    /// `range` is `None` when the editor lost focus.
    SelectionChange {
        range: Option<Range>,
        old_range: Option<Range>,
        source: Source,
    },
}

impl EngineEvent {
    pub fn name(&self) -> EventName {
        match self {
            Self::TextChange { .. } => EventName::TextChange,
            Self::SelectionChange { .. } => EventName::SelectionChange,
        }
    }
}

pub type EngineHandler = Rc<dyn Fn(&EngineEvent)>;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ListenerId(pub u64);

/// A live engine instance.
///
/// Methods take `&self`: handlers are invoked synchronously from inside
/// engine calls and may call back into the engine.
pub trait Engine {
    fn get_text(&self) -> String;

    fn get_contents(&self) -> Delta;

    fn set_contents(&self, delta: &Delta, source: Source);

    fn set_text(&self, text: &str, source: Source);

    /// Convert markup into an insertable delta (the clipboard conversion).
    fn convert_html(&self, html: &str) -> Delta;

    /// Inner markup of the rendered editor root.
    fn root_html(&self) -> String;

    fn enable(&self, enabled: bool);

    fn set_placeholder(&self, placeholder: &str);

    fn clear_history(&self);

    fn on(&self, event: EventName, handler: EngineHandler) -> ListenerId;

    /// Detach a listener. Returns `false` if it was not attached.
    fn off(&self, event: EventName, listener: ListenerId) -> bool;
}

/// Where the engine confines its floating UI.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum BoundsTarget {
    #[default]
    Document,
    Element(ElementHandle),
    Selector(String),
}

/// Construction options handed to [`EngineFactory::create`].
#[derive(Clone, Debug, PartialEq)]
pub struct EngineOptions {
    pub bounds: BoundsTarget,
    pub debug: Option<Value>,
    pub formats: Option<BTreeSet<String>>,
    pub modules: Map<String, Value>,
    /// Toolbar element found in the host markup. Takes the place of any
    /// `toolbar` entry in `modules`.
    pub toolbar: Option<ElementHandle>,
    pub placeholder: String,
    pub read_only: bool,
    pub scrolling_container: Option<String>,
    pub strict: bool,
    pub theme: Theme,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            bounds: BoundsTarget::Document,
            debug: None,
            formats: None,
            modules: Map::new(),
            toolbar: None,
            placeholder: DEFAULT_PLACEHOLDER.to_owned(),
            read_only: false,
            scrolling_container: None,
            strict: true,
            theme: Theme::default(),
        }
    }
}

/// Builds engines. One factory is resolved per process, see
/// [`crate::EngineProvider`].
pub trait EngineFactory: Send + Sync {
    type Engine: Engine + 'static;

    fn create(
        &self,
        container: &ElementHandle,
        options: EngineOptions,
    ) -> Self::Engine;

    /// Install `whitelist` on the extension found at `import_path` and
    /// register it again, replacing any earlier registration under the same
    /// name. Returns `false` if nothing can be imported from that path.
    fn register_extension(&self, import_path: &str, whitelist: &[String])
        -> bool;
}
