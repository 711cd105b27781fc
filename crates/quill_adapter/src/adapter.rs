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

//! The adapter binding a form model to an engine instance.

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::sync::Arc;

use crate::converter::{FormatConverter, ValueGetter, ValueSetter};
use crate::engine::{Engine, EngineFactory, Source};
use crate::events::{Outputs, Subscriptions};
use crate::forms::{ControlValueAccessor, OnChange, OnTouched, Validator};
use crate::host::{ElementHandle, Host};
use crate::lifecycle::LifecycleState;
use crate::markup::{BbcodeCodec, MarkupCodec};
use crate::provider::EngineProvider;
use crate::sanitize::{DefaultSanitizer, SanitizationGuard, Sanitizer};
use crate::validation::{ValidationError, Validity};
use crate::{ContentValue, Contents, EditorConfig, Format, GlobalConfig};

/// State reachable from the engine event handlers. The handlers hold it
/// weakly, so an engine never keeps its adapter alive.
pub(crate) struct Shared<E> {
    pub(crate) host: Rc<dyn Host>,
    pub(crate) engine: RefCell<Option<Rc<E>>>,
    pub(crate) on_change: RefCell<Option<OnChange>>,
    pub(crate) on_touched: RefCell<Option<OnTouched>>,
    pub(crate) value_getter: RefCell<ValueGetter<E>>,
    pub(crate) value_setter: RefCell<ValueSetter<E>>,
    pub(crate) outputs: Outputs<E>,
}

impl<E> Shared<E> {
    pub(crate) fn engine(&self) -> Option<Rc<E>> {
        self.engine.borrow().clone()
    }

    pub(crate) fn change_callback(&self) -> Option<OnChange> {
        self.on_change.borrow().clone()
    }

    pub(crate) fn touched_callback(&self) -> Option<OnTouched> {
        self.on_touched.borrow().clone()
    }
}

/// Binds a form control to one engine instance.
///
/// Construct it, register it with a [`crate::ControlRegistry`], then call
/// [`QuillEditor::after_view_init`] once the host has rendered. Values
/// written before that are buffered and written silently into the new
/// engine.
pub struct QuillEditor<F: EngineFactory> {
    pub(crate) shared: Rc<Shared<F::Engine>>,
    pub(crate) provider: Arc<EngineProvider<F>>,
    pub(crate) global: GlobalConfig,
    pub(crate) config: RefCell<EditorConfig>,
    pub(crate) state: Cell<LifecycleState>,
    pub(crate) disabled: Cell<bool>,
    pub(crate) pending: RefCell<Option<ContentValue>>,
    pub(crate) container: RefCell<Option<ElementHandle>>,
    pub(crate) subscriptions: Cell<Option<Subscriptions>>,
    format: Format,
    sanitizer: Option<Rc<dyn Sanitizer>>,
    codec: Rc<dyn MarkupCodec>,
}

impl<F: EngineFactory> QuillEditor<F> {
    pub fn new(
        provider: Arc<EngineProvider<F>>,
        host: Rc<dyn Host>,
        global: GlobalConfig,
        config: EditorConfig,
    ) -> Self {
        let codec: Rc<dyn MarkupCodec> = Rc::new(BbcodeCodec);
        let converter = build_converter(&config, None, &codec);
        let shared = Rc::new(Shared {
            host,
            engine: RefCell::new(None),
            on_change: RefCell::new(None),
            on_touched: RefCell::new(None),
            value_getter: RefCell::new(converter.getter()),
            value_setter: RefCell::new(converter.setter()),
            outputs: Outputs::default(),
        });

        Self {
            shared,
            provider,
            global,
            format: config.format,
            disabled: Cell::new(config.disabled),
            config: RefCell::new(config),
            state: Cell::new(LifecycleState::Uninitialized),
            pending: RefCell::new(None),
            container: RefCell::new(None),
            subscriptions: Cell::new(None),
            sanitizer: None,
            codec,
        }
    }

    /// Sanitize markup with `sanitizer` instead of [`DefaultSanitizer`].
    /// Only has an effect when `sanitize` is on. Resets the value getter
    /// and setter to the built-in conversion.
    pub fn with_sanitizer(mut self, sanitizer: Rc<dyn Sanitizer>) -> Self {
        self.sanitizer = Some(sanitizer);
        self.reset_value_accessors();
        self
    }

    /// Use `codec` for the `bbcode` format instead of [`BbcodeCodec`].
    /// Resets the value getter and setter to the built-in conversion.
    pub fn with_markup_codec(mut self, codec: Rc<dyn MarkupCodec>) -> Self {
        self.codec = codec;
        self.reset_value_accessors();
        self
    }

    /// Replace how the external value is read from the engine.
    pub fn set_value_getter(
        &self,
        getter: impl Fn(&F::Engine) -> ContentValue + 'static,
    ) {
        *self.shared.value_getter.borrow_mut() = Rc::new(getter);
    }

    /// Replace how an external value is turned into engine content.
    pub fn set_value_setter(
        &self,
        setter: impl Fn(&F::Engine, &ContentValue) -> Contents + 'static,
    ) {
        *self.shared.value_setter.borrow_mut() = Rc::new(setter);
    }

    /// The built-in conversion for this editor's format.
    pub fn converter(&self) -> FormatConverter {
        build_converter(&self.config.borrow(), self.sanitizer.as_ref(), &self.codec)
    }

    fn reset_value_accessors(&self) {
        let converter = self.converter();
        *self.shared.value_getter.borrow_mut() = converter.getter();
        *self.shared.value_setter.borrow_mut() = converter.setter();
    }

    pub fn format(&self) -> Format {
        self.format
    }

    pub fn state(&self) -> LifecycleState {
        self.state.get()
    }

    pub fn engine(&self) -> Option<Rc<F::Engine>> {
        self.shared.engine()
    }

    /// The element the engine was mounted into.
    pub fn container(&self) -> Option<ElementHandle> {
        self.container.borrow().clone()
    }

    pub fn outputs(&self) -> &Outputs<F::Engine> {
        &self.shared.outputs
    }

    pub fn is_disabled(&self) -> bool {
        self.disabled.get()
    }

    pub fn is_read_only(&self) -> bool {
        self.config.borrow().read_only
    }

    pub fn placeholder(&self) -> String {
        self.config.borrow().effective_placeholder()
    }

    /// Check the engine text against the configured length constraints.
    pub fn validate(&self) -> Validity {
        match self.shared.engine() {
            Some(engine) => Validity::of_text(
                &engine.get_text(),
                &self.config.borrow().constraints(),
            ),
            None => Validity::NotReady,
        }
    }

    /// Convert `value` with the current setter and write it.
    pub(crate) fn write_contents(
        &self,
        engine: &F::Engine,
        value: &ContentValue,
        source: Source,
    ) {
        let setter = self.shared.value_setter.borrow().clone();
        setter(engine, value).write_to(engine, source);
    }
}

fn build_converter(
    config: &EditorConfig,
    sanitizer: Option<&Rc<dyn Sanitizer>>,
    codec: &Rc<dyn MarkupCodec>,
) -> FormatConverter {
    let guard = if config.sanitize {
        SanitizationGuard::enabled(
            sanitizer
                .cloned()
                .unwrap_or_else(|| Rc::new(DefaultSanitizer)),
        )
    } else {
        SanitizationGuard::disabled()
    };
    FormatConverter::new(config.format, guard, codec.clone())
}

impl<F: EngineFactory> ControlValueAccessor for QuillEditor<F> {
    fn write_value(&self, value: Option<ContentValue>) {
        if let Some(value) = &value {
            if value.format() != self.format {
                log::warn!(
                    target: "quill_adapter::adapter",
                    "Writing a '{}' value into a '{}' editor",
                    value.format(),
                    self.format
                );
            }
        }
        if self.state.get() == LifecycleState::Destroyed {
            log::debug!(
                target: "quill_adapter::adapter",
                "Ignoring a write into a destroyed editor"
            );
            return;
        }
        let Some(engine) = self.shared.engine() else {
            *self.pending.borrow_mut() = value;
            return;
        };
        match value.filter(|value| !value.is_empty()) {
            Some(value) => self.write_contents(&engine, &value, Source::Api),
            None => engine.set_text("", Source::Api),
        }
    }

    fn register_on_change(&self, callback: OnChange) {
        *self.shared.on_change.borrow_mut() = Some(callback);
    }

    fn register_on_touched(&self, callback: OnTouched) {
        *self.shared.on_touched.borrow_mut() = Some(callback);
    }

    fn set_disabled_state(&self, is_disabled: bool) {
        self.disabled.set(is_disabled);
        if let Some(engine) = self.shared.engine() {
            self.apply_disabled_state(&engine);
        }
    }
}

impl<F: EngineFactory> Validator for QuillEditor<F> {
    fn validate(&self) -> Option<ValidationError> {
        QuillEditor::validate(self).into_errors()
    }
}
