#![forbid(unsafe_code)]

pub mod cache;
pub mod checker;
pub mod config;
pub mod loader;
pub mod outcome;
pub mod playlist;
pub mod probe;

pub use cache::{fingerprint, UrlCache};
pub use checker::{CheckSummary, Checker, ItemReport, ItemStatus};
pub use config::CheckerConfig;
pub use loader::{HttpLoader, PlaylistLoader, SourceError};
pub use outcome::{CheckOutcome, CheckState, ProbeMetadata, StreamDescriptor};
pub use playlist::{normalize, HttpOptions, Playlist, PlaylistInput, PlaylistItem};
pub use probe::{classify, extract_reason, ProbeCommand, ProbeError, ProbeRunner, ProcessRunner};
