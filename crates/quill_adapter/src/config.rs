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

//! Per-editor and process-wide configuration.

use std::collections::{BTreeMap, BTreeSet};
use std::str::FromStr;

use serde::Deserialize;
use serde_json::{Map, Value};
use strum_macros::{AsRefStr, Display, EnumString};

use crate::error::ConfigError;
use crate::validation::LengthConstraints;
use crate::Format;

pub const DEFAULT_PLACEHOLDER: &str = "Insert text here ...";

#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    AsRefStr,
    Display,
    EnumString,
    Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Snow,
    Bubble,
}

impl Theme {
    pub fn from_name(name: &str) -> Result<Self, ConfigError> {
        Self::from_str(name).map_err(|_| ConfigError::UnknownTheme(name.to_owned()))
    }
}

/// `"self"` confines the engine's UI to its own container, anything else is
/// a selector. Leaving bounds unset means the document body.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum Bounds {
    SelfContainer,
    Selector(String),
}

impl From<String> for Bounds {
    fn from(value: String) -> Self {
        if value == "self" {
            Self::SelfContainer
        } else {
            Self::Selector(value)
        }
    }
}

/// Options of a single editor, fixed at construction except for the
/// fields [`ConfigChange`] can update.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EditorConfig {
    pub format: Format,
    pub sanitize: bool,
    /// CSS property -> value, applied to the engine container.
    pub style: BTreeMap<String, String>,
    pub max_length: Option<usize>,
    pub min_length: Option<usize>,
    pub required: bool,
    pub bounds: Option<Bounds>,
    pub formats: Option<BTreeSet<String>>,
    pub modules: Option<Map<String, Value>>,
    pub placeholder: Option<String>,
    pub read_only: bool,
    pub disabled: bool,
    pub scrolling_container: Option<String>,
    pub strict: bool,
    pub theme: Theme,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            format: Format::default(),
            sanitize: false,
            style: BTreeMap::new(),
            max_length: None,
            min_length: None,
            required: false,
            bounds: None,
            formats: None,
            modules: None,
            placeholder: None,
            read_only: false,
            disabled: false,
            scrolling_container: None,
            strict: true,
            theme: Theme::default(),
        }
    }
}

impl EditorConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn with_format(mut self, format: Format) -> Self {
        self.format = format;
        self
    }

    pub fn constraints(&self) -> LengthConstraints {
        LengthConstraints {
            min_length: self.min_length,
            max_length: self.max_length,
            required: self.required,
        }
    }

    /// The trimmed placeholder, or [`DEFAULT_PLACEHOLDER`] when none is set.
    pub fn effective_placeholder(&self) -> String {
        self.placeholder
            .as_deref()
            .map(str::trim)
            .unwrap_or(DEFAULT_PLACEHOLDER)
            .to_owned()
    }
}

/// An engine extension whose whitelist is replaced before registration,
/// e.g. `{"import": "formats/font", "whitelist": ["serif", "mono"]}`.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct CustomExtension {
    #[serde(rename = "import")]
    pub import_path: String,
    #[serde(default)]
    pub whitelist: Vec<String>,
}

/// Adapter-level options shared by every editor of a host.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GlobalConfig {
    pub modules: Map<String, Value>,
    /// Selects the engine variant, see [`crate::EngineProvider`].
    pub language: String,
    /// Engine log level name or `false`. Forwarded to the engine unchanged.
    pub debug: Option<Value>,
    pub customs: Vec<CustomExtension>,
}

impl GlobalConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Options that may change while the engine is live.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConfigChange {
    ReadOnly(bool),
    Placeholder(String),
}

#[cfg(test)]
mod test {
    use indoc::indoc;
    use speculoos::prelude::*;

    use super::*;

    #[test]
    fn defaults_match_an_unconfigured_editor() {
        let config = EditorConfig::default();
        assert_eq!(config.format, Format::Html);
        assert!(config.strict);
        assert!(!config.sanitize);
        assert_eq!(config.theme, Theme::Snow);
        assert_eq!(config.effective_placeholder(), DEFAULT_PLACEHOLDER);
    }

    #[test]
    fn editor_config_reads_camel_case_json() {
        let config = EditorConfig::from_json(indoc! {r#"
            {
                "format": "bbcode",
                "sanitize": true,
                "maxLength": 10,
                "minLength": 2,
                "readOnly": true,
                "bounds": "self",
                "theme": "bubble",
                "style": { "height": "200px" },
                "formats": ["bold", "italic"]
            }
        "#})
        .unwrap();

        assert_eq!(config.format, Format::Markup);
        assert!(config.sanitize);
        assert_eq!(config.max_length, Some(10));
        assert_eq!(config.min_length, Some(2));
        assert!(config.read_only);
        assert_eq!(config.bounds, Some(Bounds::SelfContainer));
        assert_eq!(config.theme, Theme::Bubble);
        assert_eq!(config.style.get("height").map(String::as_str), Some("200px"));
        assert!(config.formats.unwrap().contains("bold"));
        assert_that!(config.strict).is_true();
    }

    #[test]
    fn unknown_format_in_json_is_malformed() {
        assert!(matches!(
            EditorConfig::from_json(r#"{"format": "rtf"}"#),
            Err(ConfigError::Malformed(_))
        ));
    }

    #[test]
    fn bounds_other_than_self_are_selectors() {
        assert_eq!(
            Bounds::from("#scroller".to_owned()),
            Bounds::Selector("#scroller".to_owned())
        );
    }

    #[test]
    fn placeholder_is_trimmed() {
        let config = EditorConfig {
            placeholder: Some("  Write here  ".to_owned()),
            ..Default::default()
        };
        assert_eq!(config.effective_placeholder(), "Write here");
    }

    #[test]
    fn global_config_reads_customs() {
        let config = GlobalConfig::from_json(indoc! {r#"
            {
                "language": "chinese",
                "customs": [
                    { "import": "formats/font", "whitelist": ["serif", "mono"] }
                ]
            }
        "#})
        .unwrap();

        assert_eq!(config.language, "chinese");
        assert!(config.modules.is_empty());
        assert_eq!(
            config.customs,
            vec![CustomExtension {
                import_path: "formats/font".to_owned(),
                whitelist: vec!["serif".to_owned(), "mono".to_owned()],
            }]
        );
    }

    #[test]
    fn debug_accepts_a_level_or_false() {
        let off = GlobalConfig::from_json(r#"{"debug": false}"#).unwrap();
        assert_eq!(off.debug, Some(Value::Bool(false)));

        let level = GlobalConfig::from_json(r#"{"debug": "info"}"#).unwrap();
        assert_eq!(level.debug, Some(Value::String("info".to_owned())));
    }

    #[test]
    fn theme_names_parse() {
        assert_eq!(Theme::from_name("bubble").unwrap(), Theme::Bubble);
        assert!(matches!(
            Theme::from_name("dark"),
            Err(ConfigError::UnknownTheme(_))
        ));
    }
}
