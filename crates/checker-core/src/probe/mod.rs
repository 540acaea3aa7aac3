mod classify;
mod command;
mod runner;

pub use classify::{classify, extract_reason};
pub(crate) use classify::classify_with_state;
pub use command::ProbeCommand;
pub use runner::{ProbeError, ProbeRunner, ProcessRunner};
