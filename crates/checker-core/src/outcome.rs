use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const REASON_PARSING_ERROR: &str = "Parsing error";
pub const REASON_NO_STREAMS: &str = "No streams found";
pub const REASON_TIMED_OUT: &str = "Operation timed out";

/// One stream as reported by `ffprobe -show_streams`. Fields the checker does
/// not name are kept in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StreamDescriptor {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub codec_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub codec_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bit_rate: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl StreamDescriptor {
    /// Build a descriptor from any stream record. Named fields are lifted out
    /// only when their type fits; everything else stays in `extra`, and a
    /// non-object record is kept under `extra["value"]`.
    pub fn from_value(value: Value) -> Self {
        let mut extra = match value {
            Value::Object(map) => map,
            other => {
                let mut map = Map::new();
                map.insert("value".to_string(), other);
                return Self {
                    extra: map,
                    ..Default::default()
                };
            }
        };

        Self {
            index: take(&mut extra, "index", as_u32),
            codec_type: take(&mut extra, "codec_type", as_string),
            codec_name: take(&mut extra, "codec_name", as_string),
            width: take(&mut extra, "width", as_u32),
            height: take(&mut extra, "height", as_u32),
            bit_rate: take(&mut extra, "bit_rate", |v| {
                as_string(v).or_else(|| v.as_u64().map(|n| n.to_string()))
            }),
            extra,
        }
    }

    /// Short human summary, e.g. `video h264 1280x720`.
    pub fn summary(&self) -> String {
        let mut parts = Vec::new();
        if let Some(t) = &self.codec_type {
            parts.push(t.clone());
        }
        if let Some(c) = &self.codec_name {
            parts.push(c.clone());
        }
        if let (Some(w), Some(h)) = (self.width, self.height) {
            parts.push(format!("{}x{}", w, h));
        }
        parts.join(" ")
    }
}

fn take<T>(map: &mut Map<String, Value>, key: &str, convert: impl Fn(&Value) -> Option<T>) -> Option<T> {
    let converted = map.get(key).and_then(convert)?;
    map.remove(key);
    Some(converted)
}

fn as_u32(v: &Value) -> Option<u32> {
    v.as_u64().and_then(|n| u32::try_from(n).ok())
}

fn as_string(v: &Value) -> Option<String> {
    v.as_str().map(str::to_string)
}

/// Parsed success output of the probing tool.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProbeMetadata {
    pub streams: Vec<StreamDescriptor>,
}

/// Result of checking one playlist item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CheckOutcome {
    Success { metadata: ProbeMetadata },
    Failure { reason: String },
}

impl CheckOutcome {
    pub fn failure(reason: impl Into<String>) -> Self {
        Self::Failure {
            reason: reason.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    pub fn reason(&self) -> Option<&str> {
        match self {
            Self::Failure { reason } => Some(reason),
            Self::Success { .. } => None,
        }
    }

    pub fn metadata(&self) -> Option<&ProbeMetadata> {
        match self {
            Self::Success { metadata } => Some(metadata),
            Self::Failure { .. } => None,
        }
    }
}

/// Lifecycle of a single check. Every terminal state collapses into a [`CheckOutcome`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckState {
    Pending,
    Running,
    Succeeded,
    EmptyStreams,
    ParseError,
    ProcessFailed,
    TimedOut,
}

impl CheckState {
    pub fn is_terminal(self) -> bool {
        !matches!(self, CheckState::Pending | CheckState::Running)
    }

    pub fn can_transition_to(self, target: CheckState) -> bool {
        match (self, target) {
            (CheckState::Pending, CheckState::Running) => true,
            (CheckState::Running, t) => t.is_terminal(),
            _ => false,
        }
    }
}

impl std::fmt::Display for CheckState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Running => write!(f, "running"),
            Self::Succeeded => write!(f, "succeeded"),
            Self::EmptyStreams => write!(f, "empty_streams"),
            Self::ParseError => write!(f, "parse_error"),
            Self::ProcessFailed => write!(f, "process_failed"),
            Self::TimedOut => write!(f, "timed_out"),
        }
    }
}
