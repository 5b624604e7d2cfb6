mod client;
mod config;
mod error;
mod types;

pub use client::{Sandbox, SandboxClient};
pub use config::{ResourceLimits, SandboxConfig};
pub use error::{ClientError, Result};
pub use types::{SandboxStatus, SandboxVerdict, SubmissionToken, status};
