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

//! The form control protocol and the registry controls join it through.

use std::rc::Rc;

use crate::validation::ValidationError;
use crate::ContentValue;

/// Called with the new external value after every content change.
pub type OnChange = Rc<dyn Fn(ContentValue)>;

/// Called when the control loses focus.
pub type OnTouched = Rc<dyn Fn()>;

/// How a form writes into a control and learns about its changes.
pub trait ControlValueAccessor {
    /// Write a value from the model. `None` or an empty string clears the
    /// control.
    fn write_value(&self, value: Option<ContentValue>);

    fn register_on_change(&self, callback: OnChange);

    fn register_on_touched(&self, callback: OnTouched);

    fn set_disabled_state(&self, is_disabled: bool);
}

pub trait Validator {
    /// `None` when there is nothing to report.
    fn validate(&self) -> Option<ValidationError>;
}

/// The capabilities of the controls bound to one form model.
///
/// Controls are registered once they are fully constructed.
#[derive(Default)]
pub struct ControlRegistry {
    accessors: Vec<Rc<dyn ControlValueAccessor>>,
    validators: Vec<Rc<dyn Validator>>,
}

impl ControlRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_accessor(&mut self, accessor: Rc<dyn ControlValueAccessor>) {
        self.accessors.push(accessor);
    }

    pub fn register_validator(&mut self, validator: Rc<dyn Validator>) {
        self.validators.push(validator);
    }

    /// Register a control as both value accessor and validator.
    pub fn register_control<C>(&mut self, control: &Rc<C>)
    where
        C: ControlValueAccessor + Validator + 'static,
    {
        self.accessors.push(control.clone());
        self.validators.push(control.clone());
    }

    pub fn accessors(&self) -> &[Rc<dyn ControlValueAccessor>] {
        &self.accessors
    }

    pub fn validators(&self) -> &[Rc<dyn Validator>] {
        &self.validators
    }

    pub fn write_value(&self, value: Option<ContentValue>) {
        for accessor in &self.accessors {
            accessor.write_value(value.clone());
        }
    }

    pub fn register_on_change(&self, callback: OnChange) {
        for accessor in &self.accessors {
            accessor.register_on_change(callback.clone());
        }
    }

    pub fn register_on_touched(&self, callback: OnTouched) {
        for accessor in &self.accessors {
            accessor.register_on_touched(callback.clone());
        }
    }

    pub fn set_disabled_state(&self, is_disabled: bool) {
        for accessor in &self.accessors {
            accessor.set_disabled_state(is_disabled);
        }
    }

    /// Run every validator. A rule reported by several validators keeps
    /// the first report.
    pub fn validate(&self) -> Option<ValidationError> {
        self.validators
            .iter()
            .filter_map(|validator| validator.validate())
            .reduce(|mut merged, err| {
                merged.merge(err);
                merged
            })
    }
}

#[cfg(test)]
mod test {
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    use super::*;
    use crate::validation::{MaxLengthError, RequiredError};

    #[derive(Default)]
    struct Recording {
        written: RefCell<Vec<Option<ContentValue>>>,
        disabled: Cell<bool>,
        error: Option<ValidationError>,
    }

    impl ControlValueAccessor for Recording {
        fn write_value(&self, value: Option<ContentValue>) {
            self.written.borrow_mut().push(value);
        }

        fn register_on_change(&self, _callback: OnChange) {}

        fn register_on_touched(&self, _callback: OnTouched) {}

        fn set_disabled_state(&self, is_disabled: bool) {
            self.disabled.set(is_disabled);
        }
    }

    impl Validator for Recording {
        fn validate(&self) -> Option<ValidationError> {
            self.error.clone()
        }
    }

    #[test]
    fn registered_control_receives_writes() {
        let control = Rc::new(Recording::default());
        let mut registry = ControlRegistry::new();
        registry.register_control(&control);
        registry.write_value(Some(ContentValue::Text("a".to_owned())));
        registry.set_disabled_state(true);
        assert_eq!(
            *control.written.borrow(),
            vec![Some(ContentValue::Text("a".to_owned()))]
        );
        assert!(control.disabled.get());
        assert_eq!(registry.accessors().len(), 1);
        assert_eq!(registry.validators().len(), 1);
    }

    #[test]
    fn validators_are_merged() {
        let mut registry = ControlRegistry::new();
        registry.register_validator(Rc::new(Recording {
            error: Some(ValidationError {
                required_error: Some(RequiredError { empty: true }),
                ..Default::default()
            }),
            ..Default::default()
        }));
        registry.register_validator(Rc::new(Recording::default()));
        registry.register_validator(Rc::new(Recording {
            error: Some(ValidationError {
                max_length_error: Some(MaxLengthError {
                    given: 3,
                    max_length: 2,
                }),
                ..Default::default()
            }),
            ..Default::default()
        }));

        let err = registry.validate().unwrap();
        assert!(err.required_error.is_some());
        assert!(err.max_length_error.is_some());
    }

    #[test]
    fn empty_registry_is_valid() {
        assert!(ControlRegistry::new().validate().is_none());
    }
}
