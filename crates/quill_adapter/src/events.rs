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

//! Forwarding engine events to the form model and to public observers.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::adapter::QuillEditor;
use crate::converter::canonical_html;
use crate::engine::{
    Engine, EngineEvent, EngineFactory, EventName, ListenerId, Range, Source,
};
use crate::Delta;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// A list of observers for one kind of public event.
pub struct EventEmitter<T> {
    next_id: Cell<u64>,
    observers: RefCell<Vec<(SubscriptionId, Rc<dyn Fn(&T)>)>>,
}

impl<T: 'static> EventEmitter<T> {
    pub fn new() -> Self {
        Self {
            next_id: Cell::new(0),
            observers: RefCell::new(Vec::new()),
        }
    }

    pub fn subscribe(&self, observer: impl Fn(&T) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.get());
        self.next_id.set(id.0 + 1);
        self.observers.borrow_mut().push((id, Rc::new(observer)));
        id
    }

    /// Returns `false` if `id` was not subscribed.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut observers = self.observers.borrow_mut();
        let before = observers.len();
        observers.retain(|(observer_id, _)| *observer_id != id);
        observers.len() != before
    }

    /// Call every observer subscribed when the emit started.
    pub fn emit(&self, value: &T) {
        let observers: Vec<Rc<dyn Fn(&T)>> = self
            .observers
            .borrow()
            .iter()
            .map(|(_, observer)| observer.clone())
            .collect();
        for observer in observers {
            observer(value);
        }
    }

    pub fn observer_count(&self) -> usize {
        self.observers.borrow().len()
    }
}

impl<T: 'static> Default for EventEmitter<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Emitted after every engine content change, once the model was updated.
pub struct ContentChanged<E> {
    pub editor: Rc<E>,
    /// Rendered markup, `None` for an empty document.
    pub html: Option<String>,
    pub text: String,
    pub content: Delta,
    pub delta: Delta,
    pub old_delta: Delta,
    pub source: Source,
}

pub struct SelectionChanged<E> {
    pub editor: Rc<E>,
    /// `None` when the editor lost focus.
    pub range: Option<Range>,
    pub old_range: Option<Range>,
    pub source: Source,
}

/// The public events of an editor.
pub struct Outputs<E> {
    pub editor_created: EventEmitter<Rc<E>>,
    pub content_changed: EventEmitter<ContentChanged<E>>,
    pub selection_changed: EventEmitter<SelectionChanged<E>>,
}

impl<E: 'static> Default for Outputs<E> {
    fn default() -> Self {
        Self {
            editor_created: EventEmitter::new(),
            content_changed: EventEmitter::new(),
            selection_changed: EventEmitter::new(),
        }
    }
}

/// The engine listeners attached by one adapter.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Subscriptions {
    selection: ListenerId,
    text: ListenerId,
}

impl<F: EngineFactory> QuillEditor<F> {
    pub(crate) fn attach_event_bridge(&self, engine: &F::Engine) {
        let weak = Rc::downgrade(&self.shared);
        let selection = engine.on(
            EventName::SelectionChange,
            Rc::new(move |event: &EngineEvent| {
                let EngineEvent::SelectionChange {
                    range,
                    old_range,
                    source,
                } = event
                else {
                    return;
                };
                let Some(shared) = weak.upgrade() else {
                    return;
                };
                let Some(editor) = shared.engine() else {
                    return;
                };
                log::trace!(
                    target: "quill_adapter::events",
                    "selection-change {range:?} from {source}"
                );
                let payload = SelectionChanged {
                    editor,
                    range: *range,
                    old_range: *old_range,
                    source: *source,
                };
                shared.host.run_in_zone(&mut || {
                    shared.outputs.selection_changed.emit(&payload);
                    if payload.range.is_none() {
                        if let Some(on_touched) = shared.touched_callback() {
                            on_touched();
                        }
                    }
                });
            }),
        );

        let weak = Rc::downgrade(&self.shared);
        let text = engine.on(
            EventName::TextChange,
            Rc::new(move |event: &EngineEvent| {
                let EngineEvent::TextChange {
                    delta,
                    old_delta,
                    source,
                } = event
                else {
                    return;
                };
                let Some(shared) = weak.upgrade() else {
                    return;
                };
                let Some(editor) = shared.engine() else {
                    return;
                };
                log::trace!(
                    target: "quill_adapter::events",
                    "text-change from {source}"
                );
                let payload = ContentChanged {
                    html: canonical_html(&*editor),
                    text: editor.get_text(),
                    content: editor.get_contents(),
                    delta: delta.clone(),
                    old_delta: old_delta.clone(),
                    source: *source,
                    editor,
                };
                shared.host.run_in_zone(&mut || {
                    // The model sees the change before any public observer.
                    if let Some(on_change) = shared.change_callback() {
                        let getter = shared.value_getter.borrow().clone();
                        on_change(getter(&*payload.editor));
                    }
                    shared.outputs.content_changed.emit(&payload);
                });
            }),
        );

        self.subscriptions.set(Some(Subscriptions { selection, text }));
    }

    pub(crate) fn detach_event_bridge(&self) {
        let Some(subscriptions) = self.subscriptions.take() else {
            return;
        };
        let Some(engine) = self.shared.engine() else {
            return;
        };
        for (event, listener) in [
            (EventName::SelectionChange, subscriptions.selection),
            (EventName::TextChange, subscriptions.text),
        ] {
            if !engine.off(event, listener) {
                log::debug!(
                    target: "quill_adapter::events",
                    "{event} listener was already removed"
                );
            }
        }
    }
}
