//! Handoff to the external analysis script.
//!
//! The script is an opaque collaborator (it fetches its own weather data at
//! run time); the pipeline's only obligation is to run it after the
//! extraction directory is populated and to propagate its exit status. It
//! receives no arguments.

use std::path::Path;
use std::process::Stdio;

use tokio::process::Command;
use tracing::info;

use crate::error::{Result, StageError};

/// Run `interpreter script` with inherited stdio, failing on nonzero exit.
pub async fn run_script(interpreter: &str, script: &Path) -> Result<()> {
    info!(interpreter, script = %script.display(), "running analysis script");

    let status = Command::new(interpreter)
        .arg(script)
        .stdin(Stdio::inherit())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .status()
        .await?;

    if status.success() {
        Ok(())
    } else {
        Err(StageError::ScriptFailed {
            script: script.to_path_buf(),
            status: status
                .code()
                .map(|c| format!("status {c}"))
                .unwrap_or_else(|| "a signal".to_string()),
        })
    }
}
