//! Archive format recognition.

pub mod detect;

pub use detect::SEVENZ_MAGIC;
pub use detect::check_signature;
