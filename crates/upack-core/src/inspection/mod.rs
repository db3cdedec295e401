//! Attestation checks over extracted staging content.
//!
//! A staging area is trusted only if its `.log` digest matches the `.key`
//! file and the log's result tag reads `PASS`.
//!
//! # Examples
//!
//! ```no_run
//! use std::path::Path;
//! use upack_core::inspection::verify_staging;
//!
//! let report = verify_staging(Path::new("/tmp/ppk"));
//! if report.passed() {
//!     println!("attestation verified");
//! } else if report.log_altered() {
//!     eprintln!("the log file has been altered");
//! }
//! ```

pub mod verify;

pub use verify::LOG_PASS_TAG;
pub use verify::check_key;
pub use verify::check_log_result;
pub use verify::find_attestation_file;
pub use verify::verify_staging;
