//! Verification and transfer pipeline for attested, encrypted package
//! archives.
//!
//! `upack-core` takes a password-protected 7z archive produced by an upstream
//! packer, extracts it into a private staging directory, checks that the
//! attestation log inside it is untampered and reports `PASS`, and only then
//! moves the payload into a trusted repository. The staging directory is
//! removed on every exit path.
//!
//! # Examples
//!
//! ```no_run
//! use std::path::Path;
//! use upack_core::Config;
//! use upack_core::NoopObserver;
//! use upack_core::Pipeline;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config::new("/tmp/ppk", "/srv/pip/repo");
//! let report = Pipeline::new(&config).run(Path::new("lib-0.0.7.7z"), &mut NoopObserver);
//! if let Some(err) = report.error() {
//!     eprintln!("not transferred: {err}");
//! }
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod cleanup;
pub mod config;
pub mod copy;
pub mod digest;
pub mod error;
pub mod extraction;
pub mod formats;
pub mod inspection;
pub mod pipeline;
pub mod report;
pub mod transfer;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

// Re-export main API types
pub use cleanup::StagingGuard;
pub use cleanup::remove_all;
pub use config::Config;
pub use error::AttestationFile;
pub use error::Result;
pub use error::UnpackError;
pub use extraction::ArchiveTool;
pub use extraction::SevenZip;
pub use extraction::ToolStatus;
pub use extraction::extract;
pub use inspection::verify_staging;
pub use pipeline::Pipeline;
pub use pipeline::Stage;
pub use report::ExtractionOutcome;
pub use report::MoveReport;
pub use report::NoopObserver;
pub use report::Outcome;
pub use report::PipelineObserver;
pub use report::PipelineReport;
pub use report::VerificationReport;
pub use transfer::move_all;
