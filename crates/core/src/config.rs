//! Invoker configuration loaded from environment variables.

use std::path::PathBuf;
use std::time::Duration;

/// Default executable name, resolved through `PATH`.
pub const DEFAULT_PROGRAM: &str = "zenroom";

/// Settings shared by every invocation made through one [`Invoker`](crate::Invoker).
///
/// All fields have defaults matching the plain `zenroom` CLI contract:
/// no timeout, OS temp directory, unbounded capture, config not forwarded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvokerConfig {
    /// Executable name or path (default: `zenroom`).
    pub program: String,
    /// Bounded wait for the child. `None` waits indefinitely.
    pub timeout: Option<Duration>,
    /// Directory in which payload files are created (OS default if `None`).
    pub temp_dir: Option<PathBuf>,
    /// Per-stream retention cap. Bytes beyond the cap are still drained
    /// from the pipe but discarded.
    pub max_output_bytes: Option<usize>,
    /// Pass a non-empty configuration payload as `-c <text>`.
    pub forward_config: bool,
}

impl Default for InvokerConfig {
    fn default() -> Self {
        Self {
            program: DEFAULT_PROGRAM.to_string(),
            timeout: None,
            temp_dir: None,
            max_output_bytes: None,
            forward_config: false,
        }
    }
}

impl InvokerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                    | Default   |
    /// |----------------------------|-----------|
    /// | `ZENROOM_BIN`              | `zenroom` |
    /// | `ZENROOM_TIMEOUT_SECS`     | unset     |
    /// | `ZENROOM_TEMP_DIR`         | unset     |
    /// | `ZENROOM_MAX_OUTPUT_BYTES` | unset     |
    /// | `ZENROOM_FORWARD_CONFIG`   | `false`   |
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a configuration from an arbitrary key lookup.
    ///
    /// Unparseable values are logged and replaced by their default.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let program = lookup("ZENROOM_BIN")
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or(defaults.program);

        // Zero means "no bound", same as unset.
        let timeout = parse_var::<u64, _>(&lookup, "ZENROOM_TIMEOUT_SECS")
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs);

        let temp_dir = lookup("ZENROOM_TEMP_DIR")
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from);

        let max_output_bytes = parse_var::<usize, _>(&lookup, "ZENROOM_MAX_OUTPUT_BYTES");

        let forward_config = lookup("ZENROOM_FORWARD_CONFIG")
            .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(defaults.forward_config);

        Self {
            program,
            timeout,
            temp_dir,
            max_output_bytes,
            forward_config,
        }
    }

    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_temp_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.temp_dir = Some(dir.into());
        self
    }

    pub fn with_max_output_bytes(mut self, limit: usize) -> Self {
        self.max_output_bytes = Some(limit);
        self
    }

    pub fn with_forward_config(mut self, forward: bool) -> Self {
        self.forward_config = forward;
        self
    }
}

fn parse_var<T, F>(lookup: &F, key: &str) -> Option<T>
where
    T: std::str::FromStr,
    F: Fn(&str) -> Option<String>,
{
    let raw = lookup(key)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!(key, value = %raw, "Ignoring invalid configuration value");
            None
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
