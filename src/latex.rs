use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;
use tracing::{info, warn};

use crate::error::{Error, Result};

#[derive(Debug, PartialEq)]
pub enum CompileOutcome {
    /// Path of the produced PDF.
    Built(PathBuf),
    /// The compiler is not installed; the `.tex` file is still usable.
    Skipped(String),
}

/// Run `command args… <tex>` in the directory of `tex`, killing it after `timeout`.
pub async fn compile(
    tex: &Path,
    command: &str,
    args: &[String],
    timeout: Duration,
) -> Result<CompileOutcome> {
    let dir = tex.parent().filter(|d| !d.as_os_str().is_empty()).unwrap_or(Path::new("."));
    let file = tex.file_name().unwrap_or(tex.as_os_str());

    let spawned = Command::new(command)
        .args(args)
        .arg(file)
        .current_dir(dir)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .kill_on_drop(true)
        .spawn();
    let mut child = match spawned {
        Ok(child) => child,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            warn!("{} not found; leaving {} uncompiled", command, tex.display());
            return Ok(CompileOutcome::Skipped(format!("{} not installed", command)));
        }
        Err(e) => return Err(e.into()),
    };

    let status = match tokio::time::timeout(timeout, child.wait()).await {
        Ok(status) => status?,
        Err(_) => {
            let _ = child.kill().await;
            return Err(Error::Timeout {
                command: command.to_string(),
                secs: timeout.as_secs(),
            });
        }
    };
    if !status.success() {
        return Err(Error::External {
            command: command.to_string(),
            code: status.code(),
        });
    }

    let pdf = tex.with_extension("pdf");
    info!("Compiled {}", pdf.display());
    Ok(CompileOutcome::Built(pdf))
}
