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

//! The engine's native structured content.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// An engine delta: `{"ops": [{"insert": ..., "attributes": {...}}, ...]}`.
///
/// The adapter never looks inside a delta beyond reading its text inserts;
/// the payload is handed to and from the engine as-is.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Delta(Value);

impl Delta {
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    /// A delta without any operations.
    pub fn empty() -> Self {
        Self(json!({ "ops": [] }))
    }

    /// A delta inserting `text` without formatting.
    pub fn from_text(text: &str) -> Self {
        if text.is_empty() {
            return Self::empty();
        }
        Self(json!({ "ops": [{ "insert": text }] }))
    }

    /// Build a delta from a list of operations.
    pub fn from_ops(ops: Vec<Value>) -> Self {
        Self(json!({ "ops": ops }))
    }

    /// Parse a serialized delta.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Serialize the delta.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// The operations of this delta. Anything that is not an `ops` array
    /// has no operations.
    pub fn ops(&self) -> &[Value] {
        self.0
            .get("ops")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Concatenation of all string inserts. Embeds are skipped.
    pub fn plain_text(&self) -> String {
        self.ops()
            .iter()
            .filter_map(|op| op.get("insert").and_then(Value::as_str))
            .collect()
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    pub fn into_value(self) -> Value {
        self.0
    }
}

impl Default for Delta {
    fn default() -> Self {
        Self::empty()
    }
}

impl From<Value> for Delta {
    fn from(value: Value) -> Self {
        Self(value)
    }
}
