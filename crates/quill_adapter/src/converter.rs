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

//! Conversion between external [`ContentValue`]s and engine content.
//!
//! Both directions are total. Malformed input degrades to its most literal
//! reading (plain text) instead of failing.

use std::rc::Rc;

use crate::engine::Engine;
use crate::markup::MarkupCodec;
use crate::sanitize::SanitizationGuard;
use crate::{ContentValue, Contents, Delta, Format};

/// Markup the engine renders for a document nobody has typed into, or
/// where everything typed was deleted again.
pub const EMPTY_PARAGRAPH_SENTINELS: [&str; 2] = ["<p><br></p>", "<div><br></div>"];

/// Reads the external value out of an engine.
pub type ValueGetter<E> = Rc<dyn Fn(&E) -> ContentValue>;

/// Turns an external value into content to write into an engine.
pub type ValueSetter<E> = Rc<dyn Fn(&E, &ContentValue) -> Contents>;

/// The rendered markup of the engine root, or `None` for an empty document.
pub fn canonical_html<E: Engine + ?Sized>(engine: &E) -> Option<String> {
    let html = engine.root_html();
    if EMPTY_PARAGRAPH_SENTINELS.contains(&html.as_str()) {
        None
    } else {
        Some(html)
    }
}

#[derive(Clone)]
pub struct FormatConverter {
    format: Format,
    guard: SanitizationGuard,
    codec: Rc<dyn MarkupCodec>,
}

impl FormatConverter {
    pub fn new(
        format: Format,
        guard: SanitizationGuard,
        codec: Rc<dyn MarkupCodec>,
    ) -> Self {
        Self {
            format,
            guard,
            codec,
        }
    }

    pub fn format(&self) -> Format {
        self.format
    }

    /// Read the engine content in the configured format.
    pub fn to_external<E: Engine + ?Sized>(&self, engine: &E) -> ContentValue {
        match self.format {
            Format::Text => ContentValue::Text(engine.get_text()),
            Format::Structured => ContentValue::Structured(engine.get_contents()),
            Format::Json => match engine.get_contents().to_json() {
                Ok(json) => ContentValue::Json(json),
                Err(err) => {
                    log::warn!("Could not serialize editor contents: {err}");
                    ContentValue::Json(engine.get_text())
                }
            },
            Format::Html => {
                ContentValue::Html(canonical_html(engine).unwrap_or_default())
            }
            Format::Markup => ContentValue::Markup(
                canonical_html(engine)
                    .map(|html| self.codec.build(&html))
                    .unwrap_or_default(),
            ),
        }
    }

    /// Turn an external value into engine content. Dispatches on the
    /// value's own format, so a value written in another format than the
    /// configured one is still read literally.
    pub fn to_internal<E: Engine + ?Sized>(
        &self,
        engine: &E,
        value: &ContentValue,
    ) -> Contents {
        match value {
            ContentValue::Text(text) => Contents::Text(text.clone()),
            ContentValue::Structured(delta) => Contents::Delta(delta.clone()),
            ContentValue::Json(json) => match Delta::from_json(json) {
                Ok(delta) => Contents::Delta(delta),
                Err(err) => {
                    log::warn!("Writing malformed JSON content as text: {err}");
                    Contents::Text(json.clone())
                }
            },
            ContentValue::Html(html) => self.markup_to_internal(engine, html),
            ContentValue::Markup(markup) => {
                let html = self.codec.parse(markup);
                self.markup_to_internal(engine, &html)
            }
        }
    }

    fn markup_to_internal<E: Engine + ?Sized>(
        &self,
        engine: &E,
        html: &str,
    ) -> Contents {
        Contents::Delta(engine.convert_html(&self.guard.apply(html)))
    }

    pub fn getter<E: Engine + 'static>(&self) -> ValueGetter<E> {
        let converter = self.clone();
        Rc::new(move |engine: &E| converter.to_external(engine))
    }

    pub fn setter<E: Engine + 'static>(&self) -> ValueSetter<E> {
        let converter = self.clone();
        Rc::new(move |engine: &E, value: &ContentValue| {
            converter.to_internal(engine, value)
        })
    }
}
