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

//! External content formats and the values exchanged in them.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumIter, EnumString};

use crate::engine::{Engine, Source};
use crate::error::ConfigError;
use crate::Delta;

/// The representation in which the adapter exchanges content with the
/// surrounding application.
///
/// The format is fixed for the lifetime of an adapter. Switching it after
/// the engine has been created is not supported.
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    Hash,
    AsRefStr,
    Display,
    EnumIter,
    EnumString,
    Serialize,
    Deserialize,
)]
pub enum Format {
    /// Plain text as returned by the engine.
    #[strum(serialize = "text")]
    #[serde(rename = "text")]
    Text,
    /// The engine's delta object.
    #[strum(serialize = "object")]
    #[serde(rename = "object")]
    Structured,
    /// The engine's delta serialized as JSON.
    #[strum(serialize = "json")]
    #[serde(rename = "json")]
    Json,
    /// The rendered markup of the editor root.
    #[default]
    #[strum(serialize = "html")]
    #[serde(rename = "html")]
    Html,
    /// The rendered markup passed through a [`crate::MarkupCodec`].
    #[strum(serialize = "bbcode")]
    #[serde(rename = "bbcode")]
    Markup,
}

impl Format {
    /// Parse one of the external names `object|bbcode|html|text|json`.
    pub fn from_name(name: &str) -> Result<Self, ConfigError> {
        Self::from_str(name)
            .map_err(|_| ConfigError::UnknownFormat(name.to_owned()))
    }

    /// Whether values in this format carry markup.
    pub fn is_markup(self) -> bool {
        matches!(self, Self::Html | Self::Markup)
    }
}

/// A value in one of the external formats. Exactly one payload is active.
#[derive(Clone, Debug, PartialEq)]
pub enum ContentValue {
    Text(String),
    Structured(Delta),
    Json(String),
    Html(String),
    Markup(String),
}

impl ContentValue {
    /// Wrap a string payload in the given format. A structured payload is
    /// parsed from JSON, falling back to a plain text insert.
    pub fn from_string(format: Format, payload: impl Into<String>) -> Self {
        let payload = payload.into();
        match format {
            Format::Text => Self::Text(payload),
            Format::Json => Self::Json(payload),
            Format::Html => Self::Html(payload),
            Format::Markup => Self::Markup(payload),
            Format::Structured => Self::Structured(
                Delta::from_json(&payload)
                    .unwrap_or_else(|_| Delta::from_text(&payload)),
            ),
        }
    }

    /// The empty value of a format.
    pub fn empty(format: Format) -> Self {
        match format {
            Format::Structured => Self::Structured(Delta::empty()),
            _ => Self::from_string(format, String::new()),
        }
    }

    pub fn format(&self) -> Format {
        match self {
            Self::Text(_) => Format::Text,
            Self::Structured(_) => Format::Structured,
            Self::Json(_) => Format::Json,
            Self::Html(_) => Format::Html,
            Self::Markup(_) => Format::Markup,
        }
    }

    /// The string payload, if this value has one.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) | Self::Json(s) | Self::Html(s) | Self::Markup(s) => {
                Some(s)
            }
            Self::Structured(_) => None,
        }
    }

    pub fn as_delta(&self) -> Option<&Delta> {
        match self {
            Self::Structured(delta) => Some(delta),
            _ => None,
        }
    }

    /// Only an empty string payload counts as empty. A delta object is
    /// always a value, even without operations.
    pub fn is_empty(&self) -> bool {
        self.as_str().is_some_and(str::is_empty)
    }
}

/// What gets written into the engine: either a delta or plain text.
#[derive(Clone, Debug, PartialEq)]
pub enum Contents {
    Delta(Delta),
    Text(String),
}

impl Contents {
    pub fn write_to<E: Engine + ?Sized>(&self, engine: &E, source: Source) {
        match self {
            Self::Delta(delta) => engine.set_contents(delta, source),
            Self::Text(text) => engine.set_text(text, source),
        }
    }
}

#[cfg(test)]
mod test {
    use strum::IntoEnumIterator;

    use super::{ContentValue, Format};
    use crate::{ConfigError, Delta};

    #[test]
    fn formats_use_their_external_names() {
        let names: Vec<String> = Format::iter().map(|f| f.to_string()).collect();
        assert_eq!(names, ["text", "object", "json", "html", "bbcode"]);
    }

    #[test]
    fn every_format_parses_back_from_its_name() {
        for format in Format::iter() {
            assert_eq!(Format::from_name(format.as_ref()).unwrap(), format);
        }
    }

    #[test]
    fn unknown_format_name_is_rejected() {
        assert!(matches!(
            Format::from_name("markdown"),
            Err(ConfigError::UnknownFormat(name)) if name == "markdown"
        ));
    }

    #[test]
    fn html_is_the_default_format() {
        assert_eq!(Format::default(), Format::Html);
    }

    #[test]
    fn empty_string_is_empty_but_empty_delta_is_not() {
        assert!(ContentValue::Html(String::new()).is_empty());
        assert!(!ContentValue::Structured(Delta::empty()).is_empty());
    }

    #[test]
    fn structured_from_malformed_string_becomes_text_insert() {
        let value = ContentValue::from_string(Format::Structured, "{oops");
        assert_eq!(value, ContentValue::Structured(Delta::from_text("{oops")));
    }

    #[test]
    fn value_reports_its_format() {
        assert_eq!(ContentValue::empty(Format::Markup).format(), Format::Markup);
        assert_eq!(
            ContentValue::empty(Format::Structured).format(),
            Format::Structured
        );
    }
}
