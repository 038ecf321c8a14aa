//! Process binding for the `zenroom` cryptographic virtual machine.
//!
//! Payloads are written to temporary files, the external executable is
//! spawned with flags pointing at them, and its stdout/stderr are captured.
//! All cryptography happens inside the child; this crate only orchestrates
//! the process and guarantees payload files are removed afterwards.

pub mod artifact;
pub mod blocking;
pub mod config;
pub mod error;
pub mod invoker;
pub mod request;
pub mod subprocess;

pub use config::InvokerConfig;
pub use error::InvokeError;
pub use invoker::{run_contract, run_script, Execution, Invoker, ZenResult};
pub use request::{ExecMode, InvocationRequest};
