//! External extraction tool invocation.
//!
//! Arguments are always passed as a vector to the program; no shell ever
//! sees the archive path or the passphrase.

use std::ffi::OsString;
use std::io;
use std::path::Path;
use std::path::PathBuf;
use std::process::Command;
use std::process::ExitStatus;
use std::process::Stdio;

/// Result of one tool invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolStatus {
    /// The tool exited with status zero.
    Success,
    /// The tool exited non-zero, or was killed (`None`).
    Failed(Option<i32>),
}

impl ToolStatus {
    /// Returns `true` for a zero exit status.
    #[must_use]
    pub const fn is_success(self) -> bool {
        matches!(self, Self::Success)
    }
}

impl From<ExitStatus> for ToolStatus {
    fn from(status: ExitStatus) -> Self {
        if status.success() {
            Self::Success
        } else {
            Self::Failed(status.code())
        }
    }
}

impl std::fmt::Display for ToolStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Success => write!(f, "exit status 0"),
            Self::Failed(Some(code)) => write!(f, "exit status {code}"),
            Self::Failed(None) => write!(f, "terminated by signal"),
        }
    }
}

/// An archive tool able to test and extract password-protected archives.
///
/// `Err` is reserved for failures to run the tool at all; a tool that ran
/// and rejected the archive reports `Ok(ToolStatus::Failed(_))`.
pub trait ArchiveTool {
    /// Human-readable program name for diagnostics.
    fn name(&self) -> String;

    /// Tests archive integrity under `passphrase` without writing anything.
    fn test(&self, archive: &Path, passphrase: &str) -> io::Result<ToolStatus>;

    /// Extracts every entry of `archive` flat into `output_dir`, overwriting
    /// existing files of the same name.
    fn extract(&self, archive: &Path, passphrase: &str, output_dir: &Path)
    -> io::Result<ToolStatus>;
}

/// The 7-Zip command-line program (`7z`, `7za`, `7zz`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SevenZip {
    program: PathBuf,
}

impl SevenZip {
    /// Creates a tool that runs `program`, resolved through `PATH` when it
    /// has no directory component.
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Arguments for the integrity test: `t -p<pass> -- <archive>`.
    pub(crate) fn test_args(archive: &Path, passphrase: &str) -> Vec<OsString> {
        vec![
            OsString::from("t"),
            password_switch(passphrase),
            OsString::from("--"),
            archive.as_os_str().to_owned(),
        ]
    }

    /// Arguments for flat extraction: `e -p<pass> -y -o<dir> -- <archive>`.
    pub(crate) fn extract_args(archive: &Path, passphrase: &str, output_dir: &Path) -> Vec<OsString> {
        let mut out = OsString::from("-o");
        out.push(output_dir.as_os_str());
        vec![
            OsString::from("e"),
            password_switch(passphrase),
            OsString::from("-y"),
            out,
            OsString::from("--"),
            archive.as_os_str().to_owned(),
        ]
    }

    fn run(&self, args: Vec<OsString>) -> io::Result<ToolStatus> {
        tracing::debug!(program = %self.program.display(), mode = ?args.first(), "invoking archive tool");
        let status = Command::new(&self.program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .status()?;
        Ok(status.into())
    }
}

impl Default for SevenZip {
    fn default() -> Self {
        Self::new("7z")
    }
}

impl ArchiveTool for SevenZip {
    fn name(&self) -> String {
        self.program.display().to_string()
    }

    fn test(&self, archive: &Path, passphrase: &str) -> io::Result<ToolStatus> {
        self.run(Self::test_args(archive, passphrase))
    }

    fn extract(
        &self,
        archive: &Path,
        passphrase: &str,
        output_dir: &Path,
    ) -> io::Result<ToolStatus> {
        self.run(Self::extract_args(archive, passphrase, output_dir))
    }
}

fn password_switch(passphrase: &str) -> OsString {
    OsString::from(format!("-p{passphrase}"))
}
