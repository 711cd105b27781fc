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

//! Binds an application's form model to an embedded rich text engine.
//!
//! A [`QuillEditor`] owns one engine instance. It converts between the
//! engine's content and an external [`ContentValue`] in the configured
//! [`Format`], validates length constraints, forwards engine events to the
//! form model and to public observers, and drives the engine through its
//! lifecycle. The engine, its factory and the host element tree are
//! supplied through the [`Engine`], [`EngineFactory`] and [`Host`] traits.

pub mod adapter;
pub mod config;
pub mod converter;
pub mod delta;
pub mod engine;
pub mod error;
pub mod events;
pub mod format;
pub mod forms;
mod fragment;
pub mod host;
pub mod lifecycle;
pub mod markup;
pub mod memory;
pub mod provider;
pub mod sanitize;
pub mod validation;

pub use crate::adapter::QuillEditor;
pub use crate::config::{
    Bounds, ConfigChange, CustomExtension, EditorConfig, GlobalConfig, Theme,
    DEFAULT_PLACEHOLDER,
};
pub use crate::converter::{
    canonical_html, FormatConverter, ValueGetter, ValueSetter,
    EMPTY_PARAGRAPH_SENTINELS,
};
pub use crate::delta::Delta;
pub use crate::engine::{
    BoundsTarget, Engine, EngineEvent, EngineFactory, EngineHandler,
    EngineOptions, EventName, ListenerId, Range, Source,
};
pub use crate::error::{AdapterError, ConfigError};
pub use crate::events::{
    ContentChanged, EventEmitter, Outputs, SelectionChanged, SubscriptionId,
};
pub use crate::format::{ContentValue, Contents, Format};
pub use crate::forms::{
    ControlRegistry, ControlValueAccessor, OnChange, OnTouched, Validator,
};
pub use crate::host::{ElementHandle, Host, RenderingContext};
pub use crate::lifecycle::LifecycleState;
pub use crate::markup::{BbcodeCodec, MarkupCodec};
pub use crate::memory::{MemoryEngine, MemoryEngineFactory, MemoryHost};
pub use crate::provider::{EngineProvider, GlobalProvider};
pub use crate::sanitize::{
    DefaultSanitizer, SanitizationGuard, Sanitizer, SecurityContext,
};
pub use crate::validation::{
    trimmed_length, LengthConstraints, MaxLengthError, MinLengthError,
    RequiredError, ValidationError, Validity,
};
