//! Shared helpers for invoker integration tests.
//!
//! Stub executables stand in for the `zenroom` binary. They are written once
//! per test binary, before any test spawns a child, so no test ever execs a
//! file that is still open for writing.

#![allow(dead_code)]

use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use zenroom_core::{Invoker, InvokerConfig};

/// Prints every argument on its own line to stdout and the script file
/// (last argument) to stderr.
const ECHO_ARGS: &str = r#"#!/bin/sh
for arg in "$@"; do
    printf '%s\n' "$arg"
done
for last; do :; done
cat "$last" >&2
"#;

/// Minimal VM: `print('x')` prints `x`, anything else is an undefined symbol.
const FAKE_VM: &str = r#"#!/bin/sh
for last; do :; done
script=$(cat "$last")
case "$script" in
    "print('"*"')")
        msg=${script#"print('"}
        msg=${msg%"')"}
        printf '%s\n' "$msg"
        ;;
    *)
        printf '[!] undefined symbol in: %s\n' "$script" >&2
        exit 1
        ;;
esac
"#;

/// Fills the stderr pipe well past its kernel buffer before touching stdout.
const FLOOD_STDERR: &str = r#"#!/bin/sh
head -c 262144 /dev/zero | tr '\0' e >&2
printf 'done\n'
"#;

/// Fills the stdout pipe well past its kernel buffer before touching stderr.
const FLOOD_STDOUT: &str = r#"#!/bin/sh
head -c 262144 /dev/zero | tr '\0' o
printf 'done\n' >&2
"#;

/// Never exits on its own.
const HANG: &str = "#!/bin/sh\nexec sleep 60\n";

/// Prints the keys file contents then fails.
const KEYS_THEN_FAIL: &str = r#"#!/bin/sh
while [ $# -gt 0 ]; do
    if [ "$1" = "-k" ]; then
        cat "$2"
    fi
    shift
done
echo 'verification failed' >&2
exit 3
"#;

struct Stubs {
    _dir: tempfile::TempDir,
    root: PathBuf,
}

fn stubs() -> &'static Stubs {
    static STUBS: OnceLock<Stubs> = OnceLock::new();
    STUBS.get_or_init(|| {
        let dir = tempfile::tempdir().expect("create stub dir");
        let root = dir.path().to_path_buf();
        for (name, body) in [
            ("echo-args", ECHO_ARGS),
            ("fake-vm", FAKE_VM),
            ("flood-stderr", FLOOD_STDERR),
            ("flood-stdout", FLOOD_STDOUT),
            ("hang", HANG),
            ("keys-then-fail", KEYS_THEN_FAIL),
        ] {
            let path = root.join(name);
            std::fs::write(&path, body).expect("write stub");
            std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755))
                .expect("chmod stub");
        }
        Stubs { _dir: dir, root }
    })
}

/// Absolute path of a named stub executable.
pub fn stub(name: &str) -> PathBuf {
    stubs().root.join(name)
}

/// An invoker running `stub_name`, with payload files created in `temp_dir`.
pub fn invoker(stub_name: &str, temp_dir: &Path) -> Invoker {
    Invoker::new(
        InvokerConfig::default()
            .with_program(stub(stub_name).to_string_lossy().into_owned())
            .with_temp_dir(temp_dir),
    )
}

/// Number of entries left in `dir`.
pub fn leftover_files(dir: &Path) -> usize {
    std::fs::read_dir(dir).expect("list temp dir").count()
}
