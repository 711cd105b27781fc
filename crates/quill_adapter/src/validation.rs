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

//! Length and presence validation of the editor text.

use serde::Serialize;
use widestring::Utf16String;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MinLengthError {
    pub given: usize,
    pub min_length: usize,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MaxLengthError {
    pub given: usize,
    pub max_length: usize,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct RequiredError {
    pub empty: bool,
}

/// Every rule that failed. Serializes as
/// `{"minLengthError": {...}, "maxLengthError": {...}, "requiredError": {...}}`
/// with absent rules omitted.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationError {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_length_error: Option<MinLengthError>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_length_error: Option<MaxLengthError>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required_error: Option<RequiredError>,
}

impl ValidationError {
    pub fn is_empty(&self) -> bool {
        self.min_length_error.is_none()
            && self.max_length_error.is_none()
            && self.required_error.is_none()
    }

    /// Fill in the rules `other` reports and `self` does not.
    pub fn merge(&mut self, other: ValidationError) {
        self.min_length_error = self.min_length_error.or(other.min_length_error);
        self.max_length_error = self.max_length_error.or(other.max_length_error);
        self.required_error = self.required_error.or(other.required_error);
    }
}

/// A limit of zero is the same as no limit.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LengthConstraints {
    pub min_length: Option<usize>,
    pub max_length: Option<usize>,
    pub required: bool,
}

impl LengthConstraints {
    /// Check a trimmed text length against the constraints. All failing
    /// rules are reported together.
    ///
    /// The minimum only applies to non-empty text: an empty document is the
    /// business of `required`.
    pub fn check(&self, trimmed_len: usize) -> Option<ValidationError> {
        let mut err = ValidationError::default();

        if let Some(min_length) = self.min_length.filter(|&n| n > 0) {
            if trimmed_len > 0 && trimmed_len < min_length {
                err.min_length_error = Some(MinLengthError {
                    given: trimmed_len,
                    min_length,
                });
            }
        }

        if let Some(max_length) = self.max_length.filter(|&n| n > 0) {
            if trimmed_len > max_length {
                err.max_length_error = Some(MaxLengthError {
                    given: trimmed_len,
                    max_length,
                });
            }
        }

        if self.required && trimmed_len == 0 {
            err.required_error = Some(RequiredError { empty: true });
        }

        if err.is_empty() {
            None
        } else {
            Some(err)
        }
    }
}

/// Length of `text` in UTF-16 code units after trimming surrounding
/// whitespace (including the byte order mark).
pub fn trimmed_length(text: &str) -> usize {
    let trimmed =
        text.trim_matches(|c: char| c.is_whitespace() || c == '\u{feff}');
    Utf16String::from_str(trimmed).len()
}

/// Outcome of validating an editor.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Validity {
    /// No engine exists yet, so nothing could be checked.
    NotReady,
    Valid,
    Invalid(ValidationError),
}

impl Validity {
    pub fn of_text(text: &str, constraints: &LengthConstraints) -> Self {
        match constraints.check(trimmed_length(text)) {
            Some(err) => Self::Invalid(err),
            None => Self::Valid,
        }
    }

    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid)
    }

    pub fn errors(&self) -> Option<&ValidationError> {
        match self {
            Self::Invalid(err) => Some(err),
            _ => None,
        }
    }

    /// The form protocol view: errors or nothing. `NotReady` collapses
    /// into nothing, like `Valid`.
    pub fn into_errors(self) -> Option<ValidationError> {
        match self {
            Self::Invalid(err) => Some(err),
            Self::NotReady | Self::Valid => None,
        }
    }
}

#[cfg(test)]
mod test {
    use speculoos::prelude::*;

    use super::*;

    fn min(n: usize) -> LengthConstraints {
        LengthConstraints {
            min_length: Some(n),
            ..Default::default()
        }
    }

    #[test]
    fn text_shorter_than_minimum_is_reported() {
        let err = min(5).check(2).unwrap();
        assert_eq!(
            err.min_length_error,
            Some(MinLengthError {
                given: 2,
                min_length: 5
            })
        );
        assert_that!(err.required_error).is_none();
    }

    #[test]
    fn minimum_does_not_apply_to_empty_text() {
        assert_that!(min(5).check(0)).is_none();
    }

    #[test]
    fn text_at_minimum_is_valid() {
        assert_that!(min(5).check(5)).is_none();
    }

    #[test]
    fn text_longer_than_maximum_is_reported() {
        let constraints = LengthConstraints {
            max_length: Some(10),
            ..Default::default()
        };
        let err = constraints.check(11).unwrap();
        assert_eq!(
            err.max_length_error,
            Some(MaxLengthError {
                given: 11,
                max_length: 10
            })
        );
        assert_that!(constraints.check(10)).is_none();
    }

    #[test]
    fn empty_required_text_is_reported() {
        let constraints = LengthConstraints {
            required: true,
            ..Default::default()
        };
        assert_eq!(
            constraints.check(0).unwrap().required_error,
            Some(RequiredError { empty: true })
        );
    }

    #[test]
    fn all_failing_rules_are_reported_together() {
        let constraints = LengthConstraints {
            min_length: Some(20),
            max_length: Some(3),
            required: true,
        };
        let err = constraints.check(4).unwrap();
        assert_that!(err.min_length_error).is_some();
        assert_that!(err.max_length_error).is_some();
        assert_that!(err.required_error).is_none();
    }

    #[test]
    fn zero_limits_are_ignored() {
        let constraints = LengthConstraints {
            min_length: Some(0),
            max_length: Some(0),
            required: false,
        };
        assert_that!(constraints.check(7)).is_none();
    }

    #[test]
    fn trimmed_length_counts_utf16_units() {
        assert_eq!(trimmed_length("  ab \n"), 2);
        assert_eq!(trimmed_length("\u{feff}x\n"), 1);
        assert_eq!(trimmed_length("😀"), 2);
        assert_eq!(trimmed_length("\n"), 0);
    }

    #[test]
    fn errors_serialize_with_rule_names() {
        let err = LengthConstraints {
            min_length: Some(5),
            ..Default::default()
        }
        .check(2)
        .unwrap();
        assert_eq!(
            serde_json::to_string(&err).unwrap(),
            r#"{"minLengthError":{"given":2,"minLength":5}}"#
        );
    }

    #[test]
    fn not_ready_collapses_to_no_errors() {
        assert_eq!(Validity::NotReady.into_errors(), None);
        assert!(!Validity::NotReady.is_valid());
    }

    #[test]
    fn merge_keeps_existing_rules() {
        let mut a = ValidationError {
            required_error: Some(RequiredError { empty: true }),
            ..Default::default()
        };
        a.merge(ValidationError {
            max_length_error: Some(MaxLengthError {
                given: 4,
                max_length: 3,
            }),
            required_error: None,
            ..Default::default()
        });
        assert_that!(a.required_error).is_some();
        assert_that!(a.max_length_error).is_some();
    }
}
