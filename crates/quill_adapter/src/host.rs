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

//! The host the adapter is embedded in: its element tree and its change
//! notification context.

/// Opaque reference to an element owned by the host.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementHandle(pub u64);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RenderingContext {
    /// A live UI. Engines can be created.
    Interactive,
    /// Server side rendering. No engine is ever created.
    Server,
}

pub trait Host {
    fn rendering_context(&self) -> RenderingContext;

    /// Run `task` inside the host's change notification context so that
    /// observers outside the adapter see its effects immediately.
    fn run_in_zone(&self, task: &mut dyn FnMut());

    /// Append the element the engine mounts into and return it.
    fn mount_container(&self) -> ElementHandle;

    /// The projected toolbar element, if the host markup has one.
    fn toolbar_slot(&self) -> Option<ElementHandle>;

    fn set_style(&self, element: &ElementHandle, property: &str, value: &str);

    /// Set an attribute on the host element itself.
    fn set_attribute(&self, name: &str, value: &str);

    fn remove_attribute(&self, name: &str);
}
