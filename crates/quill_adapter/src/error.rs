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

use thiserror::Error;

/// Misuse of the adapter lifecycle.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AdapterError {
    #[error("The editor engine has already been created for this adapter")]
    AlreadyInitialized,
    #[error("The adapter has been destroyed")]
    Destroyed,
    #[error("A process-wide engine provider is already installed")]
    ProviderAlreadyInstalled,
}

/// Problems found while reading an editor configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Unknown content format '{0}'")]
    UnknownFormat(String),
    #[error("Unknown theme '{0}'")]
    UnknownTheme(String),
    #[error("Malformed configuration: {0}")]
    Malformed(#[from] serde_json::Error),
}
