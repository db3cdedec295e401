//! Password-derived archive extraction through an external tool.

pub mod engine;
pub mod tool;

pub use engine::extract;
pub use tool::ArchiveTool;
pub use tool::SevenZip;
pub use tool::ToolStatus;
