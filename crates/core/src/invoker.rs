//! The process invoker: payload files in, captured streams out.
//!
//! [`Invoker::execute`] is the structured entry point. [`run_script`] and
//! [`run_contract`] keep the simple `(ZenResult, bool)` contract, where any
//! [`InvokeError`] is logged and collapsed into an empty, failed result.

use std::ffi::OsString;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::process::Command;
use tokio_util::sync::CancellationToken;

use crate::artifact::{PayloadKind, TempArtifact};
use crate::config::InvokerConfig;
use crate::error::InvokeError;
use crate::request::{ExecMode, InvocationRequest};
use crate::subprocess::{self, RunLimits};

/// Text captured from the virtual machine.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZenResult {
    /// Complete stdout: the primary result.
    pub output: String,
    /// Complete stderr: diagnostics and log lines.
    pub logs: String,
}

/// A finished invocation with exit details.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Execution {
    #[serde(flatten)]
    pub result: ZenResult,
    /// Process exit code (`None` if killed by a signal).
    pub exit_code: Option<i32>,
    /// Wall-clock duration in milliseconds.
    pub duration_ms: u64,
}

impl Execution {
    /// True iff the child exited with status zero.
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }

    /// Stdout parsed as JSON, or `None` if it is not valid JSON.
    pub fn parsed_output(&self) -> Option<Value> {
        serde_json::from_str(self.result.output.trim()).ok()
    }

    /// Split into the simple `(result, ok)` pair.
    pub fn into_pair(self) -> (ZenResult, bool) {
        let ok = self.success();
        (self.result, ok)
    }
}

/// Runs requests against one configured executable.
///
/// Holds no per-invocation state; a single `Invoker` can be shared across
/// tasks and used concurrently.
#[derive(Debug, Clone, Default)]
pub struct Invoker {
    config: InvokerConfig,
}

/// Payload files and argument vector for one invocation.
///
/// Artifacts must outlive the child; they are removed when this is dropped.
#[derive(Debug)]
pub(crate) struct PreparedArgs {
    pub(crate) args: Vec<OsString>,
    pub(crate) artifacts: Vec<TempArtifact>,
}

impl Invoker {
    pub fn new(config: InvokerConfig) -> Self {
        Self { config }
    }

    /// An invoker configured from `ZENROOM_*` environment variables.
    pub fn from_env() -> Self {
        Self::new(InvokerConfig::from_env())
    }

    pub fn config(&self) -> &InvokerConfig {
        &self.config
    }

    /// Run `request` to completion and return the captured streams.
    pub async fn execute(&self, request: &InvocationRequest) -> Result<Execution, InvokeError> {
        self.run(request, None).await
    }

    /// Like [`execute`](Self::execute), but kills the child and returns
    /// [`InvokeError::Cancelled`] once `cancel` fires.
    pub async fn execute_cancellable(
        &self,
        request: &InvocationRequest,
        cancel: &CancellationToken,
    ) -> Result<Execution, InvokeError> {
        self.run(request, Some(cancel)).await
    }

    /// Direct VM mode with the simple two-valued contract.
    pub async fn run_script(
        &self,
        script: &str,
        config: &str,
        keys: &str,
        data: &str,
    ) -> (ZenResult, bool) {
        self.run_pair(build_request(ExecMode::Script, script, config, keys, data))
            .await
    }

    /// Contract mode (`-z`) with the simple two-valued contract.
    pub async fn run_contract(
        &self,
        script: &str,
        config: &str,
        keys: &str,
        data: &str,
    ) -> (ZenResult, bool) {
        self.run_pair(build_request(ExecMode::Contract, script, config, keys, data))
            .await
    }

    async fn run_pair(&self, request: InvocationRequest) -> (ZenResult, bool) {
        match self.execute(&request).await {
            Ok(execution) => execution.into_pair(),
            Err(e) => {
                tracing::error!(
                    program = %self.config.program,
                    mode = ?request.mode,
                    error = %e,
                    "Invocation failed"
                );
                (ZenResult::default(), false)
            }
        }
    }

    async fn run(
        &self,
        request: &InvocationRequest,
        cancel: Option<&CancellationToken>,
    ) -> Result<Execution, InvokeError> {
        // `prepared` owns the payload files until the end of this function.
        let prepared = self.prepare(request)?;

        let mut cmd = Command::new(&self.config.program);
        cmd.args(&prepared.args);

        let limits = RunLimits {
            timeout: self.config.timeout,
            max_output_bytes: self.config.max_output_bytes,
        };
        let captured = subprocess::run_command(&mut cmd, limits, cancel).await?;

        Ok(Execution {
            result: ZenResult {
                output: String::from_utf8_lossy(&captured.stdout).into_owned(),
                logs: String::from_utf8_lossy(&captured.stderr).into_owned(),
            },
            exit_code: captured.status.code(),
            duration_ms: captured.elapsed.as_millis() as u64,
        })
    }

    /// Materialize payload files and build the argument list (without argv[0]).
    ///
    /// Order: mode flag, `-c <config>`, `-k <keys>`, `-a <data>`, script path.
    pub(crate) fn prepare(&self, request: &InvocationRequest) -> Result<PreparedArgs, InvokeError> {
        let dir = self.config.temp_dir.as_deref();
        let mut args: Vec<OsString> = Vec::new();
        let mut artifacts = Vec::new();

        if let Some(flag) = request.mode.flag() {
            args.push(flag.into());
        }

        if self.config.forward_config && !request.config.is_empty() {
            args.push("-c".into());
            args.push(request.config.as_str().into());
        }

        for (kind, flag, payload) in [
            (PayloadKind::Keys, "-k", &request.keys),
            (PayloadKind::Data, "-a", &request.data),
        ] {
            if payload.is_empty() {
                continue;
            }
            let artifact = TempArtifact::create(kind, payload, dir)?;
            args.push(flag.into());
            args.push(artifact.path().into());
            artifacts.push(artifact);
        }

        let script = TempArtifact::create(PayloadKind::Script, &request.script, dir)?;
        args.push(script.path().into());
        artifacts.push(script);

        Ok(PreparedArgs { args, artifacts })
    }
}

pub(crate) fn build_request(
    mode: ExecMode,
    script: &str,
    config: &str,
    keys: &str,
    data: &str,
) -> InvocationRequest {
    InvocationRequest {
        script: script.to_string(),
        config: config.to_string(),
        keys: keys.to_string(),
        data: data.to_string(),
        mode,
    }
}

/// Direct VM mode using an invoker configured from the environment.
pub async fn run_script(script: &str, config: &str, keys: &str, data: &str) -> (ZenResult, bool) {
    Invoker::from_env()
        .run_script(script, config, keys, data)
        .await
}

/// Contract mode using an invoker configured from the environment.
pub async fn run_contract(script: &str, config: &str, keys: &str, data: &str) -> (ZenResult, bool) {
    Invoker::from_env()
        .run_contract(script, config, keys, data)
        .await
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
