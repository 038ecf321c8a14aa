//! Synchronous facade for callers without an async runtime.
//!
//! Each call builds a private current-thread runtime and blocks on the
//! async invoker. Calls made from a thread that is already inside a tokio
//! runtime are refused with [`InvokeError::InsideRuntime`]; use
//! [`Invoker`](crate::Invoker) directly there.

use crate::config::InvokerConfig;
use crate::error::InvokeError;
use crate::invoker::{build_request, Execution, Invoker, ZenResult};
use crate::request::{ExecMode, InvocationRequest};

/// Run `request` on `invoker`, blocking the current thread.
pub fn execute(invoker: &Invoker, request: &InvocationRequest) -> Result<Execution, InvokeError> {
    if tokio::runtime::Handle::try_current().is_ok() {
        return Err(InvokeError::InsideRuntime);
    }
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    runtime.block_on(invoker.execute(request))
}

/// Direct VM mode, configured from the environment.
pub fn run_script(script: &str, config: &str, keys: &str, data: &str) -> (ZenResult, bool) {
    let invoker = Invoker::new(InvokerConfig::from_env());
    run_pair(&invoker, ExecMode::Script, script, config, keys, data)
}

/// Contract mode (`-z`), configured from the environment.
pub fn run_contract(script: &str, config: &str, keys: &str, data: &str) -> (ZenResult, bool) {
    let invoker = Invoker::new(InvokerConfig::from_env());
    run_pair(&invoker, ExecMode::Contract, script, config, keys, data)
}

fn run_pair(
    invoker: &Invoker,
    mode: ExecMode,
    script: &str,
    config: &str,
    keys: &str,
    data: &str,
) -> (ZenResult, bool) {
    let request = build_request(mode, script, config, keys, data);
    match execute(invoker, &request) {
        Ok(execution) => execution.into_pair(),
        Err(e) => {
            tracing::error!(program = %invoker.config().program, ?mode, error = %e, "Invocation failed");
            (ZenResult::default(), false)
        }
    }
}
