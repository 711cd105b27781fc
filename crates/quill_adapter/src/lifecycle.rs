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

//! Creation, live reconfiguration and teardown of the engine.

use std::rc::Rc;

use strum_macros::Display;

use crate::adapter::QuillEditor;
use crate::config::{Bounds, ConfigChange, EditorConfig};
use crate::engine::{BoundsTarget, Engine, EngineFactory, EngineOptions, Source};
use crate::error::AdapterError;
use crate::host::{ElementHandle, RenderingContext};

/// `Uninitialized -> Initializing -> Ready -> Destroyed`. The chain is only
/// walked forwards, and `Initializing` is entered at most once.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Display)]
pub enum LifecycleState {
    Uninitialized,
    Initializing,
    Ready,
    Destroyed,
}

const DISABLED_ATTRIBUTE: &str = "disabled";

impl<F: EngineFactory> QuillEditor<F> {
    /// Create the engine. Call once the host has rendered.
    ///
    /// Outside an interactive rendering context nothing happens and the
    /// adapter stays uninitialized.
    pub fn after_view_init(&self) -> Result<(), AdapterError> {
        match self.state.get() {
            LifecycleState::Uninitialized => {}
            LifecycleState::Initializing | LifecycleState::Ready => {
                return Err(AdapterError::AlreadyInitialized)
            }
            LifecycleState::Destroyed => return Err(AdapterError::Destroyed),
        }
        let host = self.shared.host.clone();
        if host.rendering_context() == RenderingContext::Server {
            log::debug!(
                target: "quill_adapter::lifecycle",
                "Not creating an editor engine while rendering on the server"
            );
            return Ok(());
        }

        self.transition(LifecycleState::Initializing);

        let factory = self.provider.resolve(&self.global.language);
        for custom in &self.global.customs {
            if !factory.register_extension(&custom.import_path, &custom.whitelist) {
                log::warn!(
                    target: "quill_adapter::lifecycle",
                    "Could not import engine extension '{}'",
                    custom.import_path
                );
            }
        }

        let toolbar = host.toolbar_slot();
        let container = host.mount_container();
        let config = self.config.borrow().clone();
        for (property, value) in &config.style {
            host.set_style(&container, property, value);
        }

        let options = self.engine_options(&config, &container, toolbar);
        let engine = Rc::new(factory.create(&container, options));
        *self.container.borrow_mut() = Some(container);

        let initial = self.pending.borrow_mut().take();
        if let Some(initial) = initial.filter(|value| !value.is_empty()) {
            self.write_contents(&engine, &initial, Source::Silent);
            engine.clear_history();
        }

        *self.shared.engine.borrow_mut() = Some(engine.clone());
        self.transition(LifecycleState::Ready);

        self.apply_disabled_state(&engine);
        self.shared.outputs.editor_created.emit(&engine);
        // An observer may have torn the adapter down already.
        if self.state.get() != LifecycleState::Ready {
            return Ok(());
        }
        self.attach_event_bridge(&engine);
        Ok(())
    }

    /// Apply options that changed while the engine may already be live.
    /// The new values are kept either way and used if the engine is
    /// created later.
    pub fn on_changes(&self, changes: &[ConfigChange]) {
        for change in changes {
            match change {
                ConfigChange::ReadOnly(read_only) => {
                    self.config.borrow_mut().read_only = *read_only;
                    if let Some(engine) = self.shared.engine() {
                        engine.enable(!*read_only && !self.disabled.get());
                    }
                }
                ConfigChange::Placeholder(placeholder) => {
                    self.config.borrow_mut().placeholder = Some(placeholder.clone());
                    if let Some(engine) = self.shared.engine() {
                        engine.set_placeholder(placeholder);
                    }
                }
            }
        }
    }

    /// Disabled always stops editing. Clearing it only re-enables editing
    /// when the editor is not read-only.
    pub(crate) fn apply_disabled_state(&self, engine: &F::Engine) {
        let host = &self.shared.host;
        if self.disabled.get() {
            engine.enable(false);
            host.set_attribute(DISABLED_ATTRIBUTE, DISABLED_ATTRIBUTE);
        } else {
            if !self.is_read_only() {
                engine.enable(true);
            }
            host.remove_attribute(DISABLED_ATTRIBUTE);
        }
    }

    /// Detach from the engine and drop it. Safe to call more than once.
    pub fn destroy(&self) {
        if self.state.get() == LifecycleState::Destroyed {
            return;
        }
        self.detach_event_bridge();
        self.shared.engine.borrow_mut().take();
        self.pending.borrow_mut().take();
        self.transition(LifecycleState::Destroyed);
    }

    fn transition(&self, next: LifecycleState) {
        log::debug!(
            target: "quill_adapter::lifecycle",
            "{} -> {}",
            self.state.get(),
            next
        );
        self.state.set(next);
    }

    fn engine_options(
        &self,
        config: &EditorConfig,
        container: &ElementHandle,
        toolbar: Option<ElementHandle>,
    ) -> EngineOptions {
        let mut modules = config
            .modules
            .clone()
            .unwrap_or_else(|| self.global.modules.clone());
        if toolbar.is_some() {
            modules.remove("toolbar");
        }
        let bounds = match &config.bounds {
            Some(Bounds::SelfContainer) => BoundsTarget::Element(container.clone()),
            Some(Bounds::Selector(selector)) => BoundsTarget::Selector(selector.clone()),
            None => BoundsTarget::Document,
        };

        EngineOptions {
            bounds,
            debug: self.global.debug.clone(),
            formats: config.formats.clone(),
            modules,
            toolbar,
            placeholder: config.effective_placeholder(),
            read_only: config.read_only,
            scrolling_container: config.scrolling_container.clone(),
            strict: config.strict,
            theme: config.theme,
        }
    }
}

impl<F: EngineFactory> Drop for QuillEditor<F> {
    fn drop(&mut self) {
        self.destroy();
    }
}

#[cfg(test)]
mod test {
    use std::cell::RefCell;
    use std::rc::Rc;
    use std::sync::Arc;

    use serde_json::json;
    use speculoos::prelude::*;

    use super::LifecycleState;
    use crate::config::{Bounds, ConfigChange, CustomExtension};
    use crate::engine::{BoundsTarget, Engine};
    use crate::host::Host;
    use crate::memory::{MemoryEngineFactory, MemoryHost};
    use crate::{
        AdapterError, ContentValue, ControlValueAccessor, EditorConfig,
        EngineProvider, Format, GlobalConfig, QuillEditor,
    };

    fn editor_on(
        host: Rc<MemoryHost>,
        global: GlobalConfig,
        config: EditorConfig,
    ) -> (QuillEditor<MemoryEngineFactory>, Arc<EngineProvider<MemoryEngineFactory>>) {
        let provider = Arc::new(EngineProvider::new(MemoryEngineFactory::default()));
        let editor = QuillEditor::new(provider.clone(), host, global, config);
        (editor, provider)
    }

    fn editor(config: EditorConfig) -> QuillEditor<MemoryEngineFactory> {
        editor_on(Rc::new(MemoryHost::new()), GlobalConfig::default(), config).0
    }

    #[test]
    fn engine_is_created_once() {
        let (editor, provider) = editor_on(
            Rc::new(MemoryHost::new()),
            GlobalConfig::default(),
            EditorConfig::default(),
        );
        assert_eq!(editor.state(), LifecycleState::Uninitialized);
        editor.after_view_init().unwrap();
        assert_eq!(editor.state(), LifecycleState::Ready);
        assert_eq!(
            editor.after_view_init(),
            Err(AdapterError::AlreadyInitialized)
        );
        assert_eq!(provider.resolve("").created_count(), 1);
    }

    #[test]
    fn server_rendering_creates_no_engine() {
        let (editor, provider) = editor_on(
            Rc::new(MemoryHost::server()),
            GlobalConfig::default(),
            EditorConfig::default(),
        );
        editor.after_view_init().unwrap();
        assert_eq!(editor.state(), LifecycleState::Uninitialized);
        assert_that!(editor.engine()).is_none();
        assert!(!provider.is_resolved());
        editor.write_value(Some(ContentValue::Html("<p>x</p>".to_owned())));
        editor.set_disabled_state(true);
        assert!(editor.validate().errors().is_none());
    }

    #[test]
    fn buffered_value_is_written_silently() {
        let editor = editor(EditorConfig::default());
        let changes = Rc::new(RefCell::new(0));
        let counter = changes.clone();
        editor.register_on_change(Rc::new(move |_: ContentValue| {
            *counter.borrow_mut() += 1
        }));
        editor.write_value(Some(ContentValue::Html("<p>first</p>".to_owned())));
        editor.write_value(Some(ContentValue::Html("<p>second</p>".to_owned())));
        editor.after_view_init().unwrap();

        let engine = editor.engine().unwrap();
        assert_eq!(engine.get_text(), "second\n");
        assert_eq!(engine.history_len(), 0);
        assert_eq!(*changes.borrow(), 0);
    }

    #[test]
    fn buffered_markup_is_decoded() {
        let editor = editor(EditorConfig::default().with_format(Format::Markup));
        editor.write_value(Some(ContentValue::Markup("[b]hi[/b]".to_owned())));
        editor.after_view_init().unwrap();
        assert_eq!(editor.engine().unwrap().root_html(), "<p><strong>hi</strong></p>");
    }

    #[test]
    fn empty_buffered_value_leaves_history_alone() {
        let editor = editor(EditorConfig::default());
        editor.write_value(Some(ContentValue::Html(String::new())));
        editor.after_view_init().unwrap();
        assert_eq!(editor.engine().unwrap().get_text(), "\n");
    }

    #[test]
    fn engine_options_follow_the_configuration() {
        let host = Rc::new(MemoryHost::new().with_toolbar());
        let global = GlobalConfig {
            modules: json!({ "toolbar": ["bold"], "history": {} })
                .as_object()
                .cloned()
                .unwrap(),
            debug: Some(json!("warn")),
            ..Default::default()
        };
        let config = EditorConfig {
            bounds: Some(Bounds::SelfContainer),
            placeholder: Some("  Say something  ".to_owned()),
            read_only: true,
            ..Default::default()
        };
        let (editor, provider) = editor_on(host.clone(), global, config);
        editor.after_view_init().unwrap();

        let options = provider.resolve("").last_options().unwrap();
        let container = editor.container().unwrap();
        assert_eq!(options.bounds, BoundsTarget::Element(container));
        assert_eq!(options.placeholder, "Say something");
        assert_eq!(options.toolbar, host.toolbar_slot());
        assert!(options.modules.get("toolbar").is_none());
        assert!(options.modules.get("history").is_some());
        assert_eq!(options.debug, Some(json!("warn")));
        assert!(options.read_only);
        assert!(!editor.engine().unwrap().is_enabled());
    }

    #[test]
    fn editor_modules_replace_global_modules() {
        let global = GlobalConfig {
            modules: json!({ "history": {} }).as_object().cloned().unwrap(),
            ..Default::default()
        };
        let config = EditorConfig {
            modules: json!({ "clipboard": {} }).as_object().cloned(),
            ..Default::default()
        };
        let (editor, provider) = editor_on(Rc::new(MemoryHost::new()), global, config);
        editor.after_view_init().unwrap();
        let options = provider.resolve("").last_options().unwrap();
        assert!(options.modules.get("clipboard").is_some());
        assert!(options.modules.get("history").is_none());
        assert_eq!(options.bounds, BoundsTarget::Document);
    }

    #[test]
    fn styles_are_applied_to_the_container() {
        let host = Rc::new(MemoryHost::new());
        let mut config = EditorConfig::default();
        config.style.insert("height".to_owned(), "250px".to_owned());
        let (editor, _) = editor_on(host.clone(), GlobalConfig::default(), config);
        editor.after_view_init().unwrap();
        assert_eq!(
            host.styles(),
            vec![(editor.container().unwrap(), "height".to_owned(), "250px".to_owned())]
        );
        assert_eq!(host.mounted().len(), 1);
    }

    #[test]
    fn custom_extensions_are_registered() {
        let global = GlobalConfig {
            customs: vec![
                CustomExtension {
                    import_path: "formats/font".to_owned(),
                    whitelist: vec!["serif".to_owned()],
                },
                CustomExtension {
                    import_path: "unknown/thing".to_owned(),
                    whitelist: vec![],
                },
            ],
            ..Default::default()
        };
        let (editor, provider) =
            editor_on(Rc::new(MemoryHost::new()), global, EditorConfig::default());
        editor.after_view_init().unwrap();
        let registrations = provider.resolve("").registrations();
        assert_eq!(registrations.len(), 1);
        assert_eq!(registrations["formats/font"], vec!["serif".to_owned()]);
    }

    #[test]
    fn buffered_disabled_state_is_applied_on_creation() {
        let host = Rc::new(MemoryHost::new());
        let (editor, _) =
            editor_on(host.clone(), GlobalConfig::default(), EditorConfig::default());
        editor.set_disabled_state(true);
        editor.after_view_init().unwrap();
        assert!(!editor.engine().unwrap().is_enabled());
        assert_eq!(host.attribute("disabled").as_deref(), Some("disabled"));
    }

    #[test]
    fn read_only_wins_over_clearing_disabled() {
        let host = Rc::new(MemoryHost::new());
        let (editor, _) =
            editor_on(host.clone(), GlobalConfig::default(), EditorConfig::default());
        editor.after_view_init().unwrap();
        editor.on_changes(&[ConfigChange::ReadOnly(true)]);
        editor.set_disabled_state(true);
        editor.set_disabled_state(false);
        assert!(!editor.engine().unwrap().is_enabled());
        assert_that!(host.attribute("disabled")).is_none();
    }

    #[test]
    fn clearing_disabled_re_enables_editing() {
        let editor = editor(EditorConfig::default());
        editor.after_view_init().unwrap();
        editor.set_disabled_state(true);
        assert!(!editor.engine().unwrap().is_enabled());
        editor.set_disabled_state(false);
        assert!(editor.engine().unwrap().is_enabled());
    }

    #[test]
    fn live_changes_update_the_engine() {
        let editor = editor(EditorConfig::default());
        editor.after_view_init().unwrap();
        let engine = editor.engine().unwrap();
        editor.on_changes(&[
            ConfigChange::ReadOnly(true),
            ConfigChange::Placeholder("Type...".to_owned()),
        ]);
        assert!(!engine.is_enabled());
        assert_eq!(engine.placeholder(), "Type...");
        editor.on_changes(&[ConfigChange::ReadOnly(false)]);
        assert!(engine.is_enabled());
    }

    #[test]
    fn changes_before_creation_are_kept() {
        let (editor, provider) = editor_on(
            Rc::new(MemoryHost::new()),
            GlobalConfig::default(),
            EditorConfig::default(),
        );
        editor.on_changes(&[ConfigChange::Placeholder("Later".to_owned())]);
        editor.after_view_init().unwrap();
        assert_eq!(provider.resolve("").last_options().unwrap().placeholder, "Later");
    }

    #[test]
    fn destroy_is_idempotent_and_final() {
        let editor = editor(EditorConfig::default());
        editor.after_view_init().unwrap();
        let engine = editor.engine().unwrap();
        assert_eq!(engine.listener_count(), 2);
        editor.destroy();
        editor.destroy();
        assert_eq!(engine.listener_count(), 0);
        assert_eq!(editor.state(), LifecycleState::Destroyed);
        assert_that!(editor.engine()).is_none();
        assert_eq!(editor.after_view_init(), Err(AdapterError::Destroyed));
    }

    #[test]
    fn destroying_from_the_created_event_leaves_no_listeners() {
        let editor = Rc::new(editor(EditorConfig::default()));
        let created = Rc::new(RefCell::new(None));
        let weak = Rc::downgrade(&editor);
        let slot = created.clone();
        editor.outputs().editor_created.subscribe(move |engine| {
            *slot.borrow_mut() = Some(engine.clone());
            if let Some(editor) = weak.upgrade() {
                editor.destroy();
            }
        });

        editor.after_view_init().unwrap();

        let engine = created.borrow().clone().unwrap();
        assert_eq!(editor.state(), LifecycleState::Destroyed);
        assert_eq!(engine.listener_count(), 0);
        editor.destroy();
        assert_eq!(engine.listener_count(), 0);
    }

    #[test]
    fn dropping_the_editor_detaches_listeners() {
        let editor = editor(EditorConfig::default());
        editor.after_view_init().unwrap();
        let engine = editor.engine().unwrap();
        drop(editor);
        assert_eq!(engine.listener_count(), 0);
    }
}
