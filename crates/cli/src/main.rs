//! `zenroom-cli` -- run a script through the `zenroom` virtual machine.
//!
//! Reads the script (and optional keys/data) from files, invokes the VM via
//! `zenroom-core`, prints the VM's stdout to stdout and its logs to stderr,
//! and exits 0 only if the VM did.
//!
//! # Environment variables
//!
//! | Variable                   | Required | Default   | Description                         |
//! |----------------------------|----------|-----------|-------------------------------------|
//! | `ZENROOM_BIN`              | no       | `zenroom` | VM executable                       |
//! | `ZENROOM_TIMEOUT_SECS`     | no       | --        | Kill the VM after this many seconds |
//! | `ZENROOM_TEMP_DIR`         | no       | OS temp   | Where payload files are written     |
//! | `ZENROOM_MAX_OUTPUT_BYTES` | no       | --        | Per-stream capture cap              |
//! | `ZENROOM_FORWARD_CONFIG`   | no       | `false`   | Pass `--conf` to the VM as `-c`     |

use std::io::{Read, Write};
use std::path::Path;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use zenroom_core::{ExecMode, InvocationRequest, Invoker, InvokerConfig};

#[derive(Parser)]
#[command(name = "zenroom-cli", version, about = "Run scripts through the zenroom VM")]
struct Cli {
    /// Script file to execute (`-` reads stdin)
    script: String,

    /// Execute as a contract (`-z`) instead of a raw script
    #[arg(short = 'z', long)]
    contract: bool,

    /// Configuration string for the VM
    #[arg(short, long, default_value = "")]
    conf: String,

    /// Keys file
    #[arg(short, long)]
    keys: Option<String>,

    /// Data file
    #[arg(short = 'a', long)]
    data: Option<String>,

    /// Kill the VM after this many seconds; 0 disables (overrides ZENROOM_TIMEOUT_SECS)
    #[arg(long)]
    timeout: Option<u64>,

    /// Print the full execution record as JSON on stdout
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "zenroom_cli=info,zenroom_core=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let config = apply_timeout(InvokerConfig::from_env(), cli.timeout);

    let request = InvocationRequest {
        script: read_input(&cli.script)?,
        config: cli.conf.clone(),
        keys: read_optional(cli.keys.as_deref())?,
        data: read_optional(cli.data.as_deref())?,
        mode: if cli.contract {
            ExecMode::Contract
        } else {
            ExecMode::Script
        },
    };

    tracing::info!(
        program = %config.program,
        mode = ?request.mode,
        has_keys = !request.keys.is_empty(),
        has_data = !request.data.is_empty(),
        "Invoking VM",
    );

    let invoker = Invoker::new(config);
    let execution = invoker
        .execute(&request)
        .await
        .context("VM invocation failed")?;

    if cli.json {
        let mut stdout = std::io::stdout().lock();
        serde_json::to_writer_pretty(&mut stdout, &execution)?;
        writeln!(stdout)?;
    } else {
        print!("{}", execution.result.output);
        eprint!("{}", execution.result.logs);
    }

    if !execution.success() {
        tracing::warn!(exit_code = ?execution.exit_code, "VM reported failure");
        std::process::exit(1);
    }
    Ok(())
}

/// Apply `--timeout`: absent keeps the environment value, 0 clears it.
fn apply_timeout(mut config: InvokerConfig, secs: Option<u64>) -> InvokerConfig {
    if let Some(secs) = secs {
        config.timeout = (secs > 0).then(|| Duration::from_secs(secs));
    }
    config
}

/// Read a file, or stdin when `path` is `-`.
fn read_input(path: &str) -> anyhow::Result<String> {
    if path == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("failed to read script from stdin")?;
        return Ok(buf);
    }
    std::fs::read_to_string(Path::new(path)).with_context(|| format!("failed to read {path}"))
}

/// Missing optional inputs become empty payloads, which the invoker omits.
fn read_optional(path: Option<&str>) -> anyhow::Result<String> {
    match path {
        Some(path) => read_input(path),
        None => Ok(String::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env_config() -> InvokerConfig {
        InvokerConfig::default().with_timeout(Duration::from_secs(30))
    }

    #[test]
    fn timeout_flag_absent_keeps_env_value() {
        assert_eq!(
            apply_timeout(env_config(), None).timeout,
            Some(Duration::from_secs(30))
        );
    }

    #[test]
    fn timeout_flag_overrides_env_value() {
        assert_eq!(
            apply_timeout(env_config(), Some(5)).timeout,
            Some(Duration::from_secs(5))
        );
    }

    #[test]
    fn zero_timeout_flag_disables_bound() {
        assert_eq!(apply_timeout(env_config(), Some(0)).timeout, None);
    }

    #[test]
    fn cli_parses_contract_invocation() {
        let cli = Cli::try_parse_from([
            "zenroom-cli",
            "-z",
            "-k",
            "keys.json",
            "--timeout",
            "0",
            "c.zen",
        ])
        .expect("valid arguments");
        assert!(cli.contract);
        assert_eq!(cli.keys.as_deref(), Some("keys.json"));
        assert_eq!(cli.timeout, Some(0));
        assert_eq!(cli.script, "c.zen");
    }
}
