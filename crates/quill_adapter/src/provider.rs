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

//! Resolution of the engine factory.
//!
//! Loading an engine build is expensive, so the factory (and its locale
//! variant) is chosen once per provider and then reused by every adapter
//! sharing that provider. A [`GlobalProvider`] slot holds one provider for
//! the whole process.

use std::collections::HashMap;
use std::sync::Arc;

use once_cell::sync::OnceCell;

use crate::engine::EngineFactory;
use crate::error::AdapterError;

pub struct EngineProvider<F> {
    default: Arc<F>,
    variants: HashMap<String, Arc<F>>,
    resolved: OnceCell<Arc<F>>,
}

impl<F: EngineFactory> EngineProvider<F> {
    pub fn new(default: F) -> Self {
        Self {
            default: Arc::new(default),
            variants: HashMap::new(),
            resolved: OnceCell::new(),
        }
    }

    /// Use `factory` when the configured language is `language`.
    pub fn with_variant(mut self, language: impl Into<String>, factory: F) -> Self {
        self.variants.insert(language.into(), Arc::new(factory));
        self
    }

    /// The factory for `language`. Only the first call chooses; later calls
    /// get the same factory whatever language they ask for.
    pub fn resolve(&self, language: &str) -> Arc<F> {
        self.resolved
            .get_or_init(|| match self.variants.get(language) {
                Some(variant) => {
                    log::debug!(
                        target: "quill_adapter::provider",
                        "Resolved engine variant for language '{language}'"
                    );
                    variant.clone()
                }
                None => {
                    log::debug!(
                        target: "quill_adapter::provider",
                        "Resolved default engine"
                    );
                    self.default.clone()
                }
            })
            .clone()
    }

    pub fn is_resolved(&self) -> bool {
        self.resolved.get().is_some()
    }
}

/// Process-wide slot for one [`EngineProvider`]. Install it at start-up:
///
/// ```
/// use quill_adapter::{EngineProvider, GlobalProvider, MemoryEngineFactory};
///
/// static PROVIDER: GlobalProvider<MemoryEngineFactory> = GlobalProvider::new();
///
/// let provider = PROVIDER
///     .install(EngineProvider::new(MemoryEngineFactory::default()))
///     .unwrap();
/// assert!(PROVIDER.install(EngineProvider::new(MemoryEngineFactory::default())).is_err());
/// assert!(std::sync::Arc::ptr_eq(&provider, &PROVIDER.get().unwrap()));
/// ```
pub struct GlobalProvider<F> {
    slot: OnceCell<Arc<EngineProvider<F>>>,
}

impl<F> GlobalProvider<F> {
    pub const fn new() -> Self {
        Self {
            slot: OnceCell::new(),
        }
    }

    pub fn get(&self) -> Option<Arc<EngineProvider<F>>> {
        self.slot.get().cloned()
    }
}

impl<F: EngineFactory> GlobalProvider<F> {
    /// Install `provider`. Fails if one is installed already.
    pub fn install(
        &self,
        provider: EngineProvider<F>,
    ) -> Result<Arc<EngineProvider<F>>, AdapterError> {
        let provider = Arc::new(provider);
        self.slot
            .set(provider.clone())
            .map_err(|_| AdapterError::ProviderAlreadyInstalled)?;
        Ok(provider)
    }
}

impl<F> Default for GlobalProvider<F> {
    fn default() -> Self {
        Self::new()
    }
}
