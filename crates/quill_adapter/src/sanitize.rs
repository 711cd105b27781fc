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

//! Neutralising unsafe markup before it reaches the engine.

use std::borrow::Cow;
use std::rc::Rc;

use html5ever::{Attribute, QualName};
use strum_macros::Display;

use crate::fragment::{Fragment, FragmentFilter, Verdict, HTML_NAMESPACE};

/// The kind of value being sanitized.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Display)]
pub enum SecurityContext {
    None,
    Html,
    Style,
    Script,
    Url,
    ResourceUrl,
}

/// Externally supplied sanitizer. Assumed to be total over its inputs.
pub trait Sanitizer {
    fn sanitize(&self, context: SecurityContext, value: &str) -> String;
}

/// Removed together with everything inside them.
const DROPPED_ELEMENTS: [&str; 16] = [
    "applet", "base", "embed", "form", "frame", "frameset", "iframe", "link",
    "meta", "noembed", "noframes", "noscript", "object", "script", "style",
    "template",
];

/// Document level tags a fragment can carry. Only their content is kept.
const UNWRAPPED_ELEMENTS: [&str; 3] = ["html", "head", "body"];

const URL_ATTRIBUTES: [&str; 9] = [
    "action", "background", "cite", "data", "formaction", "href", "poster",
    "src", "srcset",
];

const SCRIPT_SCHEMES: [&str; 2] = ["javascript:", "vbscript:"];

/// Parser based sanitizer used when sanitizing is switched on and the host
/// did not supply its own.
///
/// In the HTML context the markup is parsed into a tree first. Script
/// capable elements, elements outside the HTML namespace, comments, inline
/// event handlers and script URLs are left out when the tree is written
/// back. URL attributes are checked after entity decoding, the way a
/// browser reads them. In the URL contexts a script URL is prefixed with
/// `unsafe:`. Other contexts pass through.
#[derive(Clone, Copy, Debug, Default)]
pub struct DefaultSanitizer;

impl Sanitizer for DefaultSanitizer {
    fn sanitize(&self, context: SecurityContext, value: &str) -> String {
        match context {
            SecurityContext::Html => Fragment::parse(value).write(self),
            SecurityContext::Url | SecurityContext::ResourceUrl
                if is_script_url(value) =>
            {
                format!("unsafe:{value}")
            }
            _ => value.to_owned(),
        }
    }
}

impl FragmentFilter for DefaultSanitizer {
    fn element(&self, name: &QualName) -> Verdict {
        let tag: &str = &name.local;
        if &*name.ns != HTML_NAMESPACE || DROPPED_ELEMENTS.contains(&tag) {
            Verdict::Drop
        } else if UNWRAPPED_ELEMENTS.contains(&tag) {
            Verdict::Unwrap
        } else {
            Verdict::Keep
        }
    }

    fn attribute(&self, _element: &QualName, attr: &Attribute) -> bool {
        let name: &str = &attr.name.local;
        if name.starts_with("on") {
            return false;
        }
        !(URL_ATTRIBUTES.contains(&name) && is_script_url(&attr.value))
    }
}

/// Whether `url` runs script when followed. Browsers ignore ASCII
/// whitespace and control characters inside the scheme, so they are
/// ignored here too.
fn is_script_url(url: &str) -> bool {
    let scheme: String = url
        .chars()
        .filter(|c| !c.is_ascii_whitespace() && !c.is_ascii_control())
        .take(16)
        .collect::<String>()
        .to_ascii_lowercase();
    SCRIPT_SCHEMES.iter().any(|s| scheme.starts_with(s))
}

/// Applies a sanitizer to markup on its way into the engine, when enabled.
#[derive(Clone, Default)]
pub struct SanitizationGuard {
    sanitizer: Option<Rc<dyn Sanitizer>>,
}

impl SanitizationGuard {
    pub fn disabled() -> Self {
        Self { sanitizer: None }
    }

    pub fn enabled(sanitizer: Rc<dyn Sanitizer>) -> Self {
        Self {
            sanitizer: Some(sanitizer),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.sanitizer.is_some()
    }

    pub fn apply<'a>(&self, markup: &'a str) -> Cow<'a, str> {
        match &self.sanitizer {
            Some(sanitizer) => {
                Cow::Owned(sanitizer.sanitize(SecurityContext::Html, markup))
            }
            None => Cow::Borrowed(markup),
        }
    }
}
