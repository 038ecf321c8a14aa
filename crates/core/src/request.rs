//! Invocation request types.

use serde::{Deserialize, Serialize};

/// How the virtual machine interprets the script payload.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecMode {
    /// Raw script executed directly by the VM.
    #[default]
    Script,
    /// Compiled contract mode (`-z`).
    Contract,
}

impl ExecMode {
    /// Flag inserted right after the executable name, if any.
    pub fn flag(self) -> Option<&'static str> {
        match self {
            Self::Script => None,
            Self::Contract => Some("-z"),
        }
    }
}

/// Everything a single invocation needs.
///
/// Empty `config`, `keys` or `data` strings mean "not supplied": no file is
/// written and no flag is passed. The script is always passed, even if empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvocationRequest {
    pub script: String,
    #[serde(default)]
    pub config: String,
    #[serde(default)]
    pub keys: String,
    #[serde(default)]
    pub data: String,
    #[serde(default)]
    pub mode: ExecMode,
}

impl InvocationRequest {
    /// A direct-mode request carrying only a script.
    pub fn script(script: impl Into<String>) -> Self {
        Self {
            script: script.into(),
            ..Self::default()
        }
    }

    /// A contract-mode request carrying only a script.
    pub fn contract(script: impl Into<String>) -> Self {
        Self {
            script: script.into(),
            mode: ExecMode::Contract,
            ..Self::default()
        }
    }

    pub fn with_config(mut self, config: impl Into<String>) -> Self {
        self.config = config.into();
        self
    }

    pub fn with_keys(mut self, keys: impl Into<String>) -> Self {
        self.keys = keys.into();
        self
    }

    pub fn with_data(mut self, data: impl Into<String>) -> Self {
        self.data = data.into();
        self
    }
}
