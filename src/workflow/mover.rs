//! Native file copy.
//!
//! Files are copied by the host's own tool rather than byte by byte, so
//! Windows shares get robocopy's resume and skip handling.

use async_trait::async_trait;
use tokio::process::Command;

use crate::error::ItaloError;
use crate::state::paths;

/// Copies one file to its new location, leaving the source in place
#[async_trait]
pub trait FileMover: Send + Sync {
    async fn copy(&self, source: &str, target: &str) -> Result<(), ItaloError>;
}

/// Host copy tool, chosen once at startup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CopyTool {
    /// `robocopy` with compression and quiet output (Windows)
    Robocopy,
    /// Plain `cp` (everything else)
    Cp,
}

impl CopyTool {
    pub fn for_host() -> Self {
        if cfg!(windows) {
            CopyTool::Robocopy
        } else {
            CopyTool::Cp
        }
    }

    /// Program and arguments copying `source` to `target`
    pub fn command(&self, source: &str, target: &str) -> (&'static str, Vec<String>) {
        match self {
            // robocopy works on directories plus a file filter
            CopyTool::Robocopy => (
                "robocopy",
                vec![
                    paths::parent_dir(source).to_string(),
                    paths::parent_dir(target).to_string(),
                    paths::file_name(source).to_string(),
                    "/COMPRESS".to_string(),
                    "/NJH".to_string(),
                    "/NJS".to_string(),
                    "/NDL".to_string(),
                    "/NP".to_string(),
                ],
            ),
            CopyTool::Cp => ("cp", vec![source.to_string(), target.to_string()]),
        }
    }

    fn succeeded(&self, status: std::process::ExitStatus) -> bool {
        match self {
            // robocopy exit codes below 8 mean nothing failed
            CopyTool::Robocopy => status.code().is_some_and(|code| code < 8),
            CopyTool::Cp => status.success(),
        }
    }
}

#[async_trait]
impl FileMover for CopyTool {
    async fn copy(&self, source: &str, target: &str) -> Result<(), ItaloError> {
        let (program, args) = self.command(source, target);
        tracing::debug!(program, ?args, "copying file");

        let copy_error = |reason: String| ItaloError::CopyFailed {
            source_path: source.to_string(),
            reason,
        };

        let output = Command::new(program)
            .args(&args)
            .output()
            .await
            .map_err(|err| copy_error(err.to_string()))?;
        if self.succeeded(output.status) {
            return Ok(());
        }

        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        let reason = if stderr.is_empty() {
            format!("{} exited with {}", program, output.status)
        } else {
            stderr
        };
        Err(copy_error(reason))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_robocopy_arguments() {
        let (program, args) = CopyTool::Robocopy.command(
            r"D:\scans\slide1.svs",
            r"\\srv\share\scans\slide1.svs",
        );
        assert_eq!(program, "robocopy");
        assert_eq!(&args[..3], &[r"D:\scans", r"\\srv\share\scans", "slide1.svs"]);
        assert!(args.contains(&"/COMPRESS".to_string()));
    }

    #[test]
    fn test_robocopy_from_drive_root() {
        let (_, args) = CopyTool::Robocopy.command(r"D:\slide1.svs", r"\\srv\share\slide1.svs");
        assert_eq!(&args[..3], &[r"D:\", r"\\srv\share", "slide1.svs"]);
    }

    #[test]
    fn test_cp_arguments() {
        let (program, args) = CopyTool::Cp.command("/data/a.svs", "//srv/share/a.svs");
        assert_eq!(program, "cp");
        assert_eq!(args, vec!["/data/a.svs", "//srv/share/a.svs"]);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_cp_keeps_source() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("slide.svs");
        let target = dir.path().join("copy.svs");
        std::fs::write(&source, b"pixels").unwrap();

        CopyTool::Cp
            .copy(source.to_str().unwrap(), target.to_str().unwrap())
            .await
            .unwrap();

        assert_eq!(std::fs::read(&target).unwrap(), b"pixels");
        assert!(source.exists());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_cp_failure_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("missing.svs");
        let target = dir.path().join("copy.svs");

        let result = CopyTool::Cp
            .copy(source.to_str().unwrap(), target.to_str().unwrap())
            .await;
        assert!(matches!(result, Err(ItaloError::CopyFailed { .. })));
    }
}
