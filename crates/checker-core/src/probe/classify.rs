use serde::Deserialize;

use crate::outcome::{
    CheckOutcome, CheckState, ProbeMetadata, StreamDescriptor, REASON_NO_STREAMS,
    REASON_PARSING_ERROR, REASON_TIMED_OUT,
};

/// Classify the stdout of a probe run that exited cleanly.
pub fn classify(stdout: &str) -> CheckOutcome {
    classify_with_state(stdout).1
}

pub(crate) fn classify_with_state(stdout: &str) -> (CheckState, CheckOutcome) {
    if stdout.trim().is_empty() {
        return (CheckState::ParseError, CheckOutcome::failure(REASON_PARSING_ERROR));
    }

    match serde_json::from_str::<RawProbeOutput>(stdout) {
        Ok(raw) if raw.streams.is_empty() => {
            (CheckState::EmptyStreams, CheckOutcome::failure(REASON_NO_STREAMS))
        }
        Ok(raw) => {
            let metadata = ProbeMetadata {
                streams: raw.streams.into_iter().map(StreamDescriptor::from_value).collect(),
            };
            (CheckState::Succeeded, CheckOutcome::Success { metadata })
        }
        Err(_) => (CheckState::ParseError, CheckOutcome::failure(REASON_PARSING_ERROR)),
    }
}

/// Only the presence of a `streams` list decides the outcome; records are untyped here.
#[derive(Deserialize)]
struct RawProbeOutput {
    streams: Vec<serde_json::Value>,
}

/// Pull the per-target diagnostic for `url` out of the probe's error text.
///
/// The probing tool prefixes its diagnostics with `<url>: `. When no such line
/// exists the reason is always "Operation timed out", whatever the real cause.
pub fn extract_reason(error_text: &str, url: &str) -> String {
    let prefix = format!("{}: ", url);
    error_text
        .lines()
        .find_map(|line| line.strip_prefix(&prefix))
        .map(str::to_string)
        .unwrap_or_else(|| REASON_TIMED_OUT.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    const URL: &str = "http://x/a.m3u8";

    #[test]
    fn streams_present_is_success() {
        let out = classify(r#"{"streams":[{"index":0,"codec_type":"video","codec_name":"h264"}]}"#);
        let metadata = out.metadata().unwrap();
        assert_eq!(metadata.streams.len(), 1);
        assert_eq!(metadata.streams[0].codec_name.as_deref(), Some("h264"));
    }

    #[test]
    fn empty_streams() {
        assert_eq!(classify(r#"{"streams":[]}"#), CheckOutcome::failure("No streams found"));
    }

    #[test]
    fn empty_or_garbage_is_parsing_error() {
        for input in ["", "   \n", "not json", "{\"streams\":", "null", "[]", "{}", r#"{"streams":"x"}"#] {
            assert_eq!(classify(input), CheckOutcome::failure("Parsing error"), "input: {input:?}");
        }
    }

    #[test]
    fn any_non_empty_stream_list_is_success() {
        for input in [
            r#"{"streams":[{"index":0,"width":-1}]}"#,
            r#"{"streams":[{"index":"0"}]}"#,
            r#"{"streams":[{"bit_rate":128000}]}"#,
            r#"{"streams":["x"]}"#,
            r#"{"streams":[null]}"#,
        ] {
            let out = classify(input);
            assert!(out.is_success(), "input: {input:?} -> {out:?}");
            assert_eq!(out.metadata().unwrap().streams.len(), 1);
        }
    }

    #[test]
    fn mistyped_fields_survive_in_extra() {
        let out = classify(r#"{"streams":[{"index":"0","codec_name":"aac"}]}"#);
        let stream = &out.metadata().unwrap().streams[0];
        assert_eq!(stream.codec_name.as_deref(), Some("aac"));
        assert_eq!(stream.index, None);
        assert_eq!(stream.extra.get("index").and_then(|v| v.as_str()), Some("0"));
    }

    #[test]
    fn pretty_printed_output_is_accepted() {
        let out = classify("{\n    \"streams\": [\n        {\n            \"index\": 0\n        }\n    ]\n}\n");
        assert!(out.is_success());
    }

    #[test]
    fn classify_reports_terminal_state() {
        assert_eq!(classify_with_state("").0, CheckState::ParseError);
        assert_eq!(classify_with_state(r#"{"streams":[]}"#).0, CheckState::EmptyStreams);
        assert_eq!(classify_with_state(r#"{"streams":[{}]}"#).0, CheckState::Succeeded);
    }

    #[test]
    fn reason_from_prefixed_line() {
        let text = "Command failed: ffprobe 'http://x/a.m3u8'\nhttp://x/a.m3u8: Connection refused\n";
        assert_eq!(extract_reason(text, URL), "Connection refused");
    }

    #[test]
    fn first_matching_line_wins() {
        let text = "http://x/a.m3u8: Server returned 404 Not Found\nhttp://x/a.m3u8: Invalid data\n";
        assert_eq!(extract_reason(text, URL), "Server returned 404 Not Found");
    }

    #[test]
    fn no_matching_line_is_timeout() {
        assert_eq!(extract_reason("", URL), "Operation timed out");
        assert_eq!(extract_reason("something else\n", URL), "Operation timed out");
        // URL must be followed by ": " exactly.
        assert_eq!(extract_reason("http://x/a.m3u8 failed\n", URL), "Operation timed out");
        assert_eq!(extract_reason("  http://x/a.m3u8: indented\n", URL), "Operation timed out");
    }

    #[test]
    fn other_urls_do_not_match() {
        let text = "http://x/b.m3u8: Connection refused\n";
        assert_eq!(extract_reason(text, URL), "Operation timed out");
    }

    #[test]
    fn empty_diagnostic_is_kept() {
        assert_eq!(extract_reason("http://x/a.m3u8: \n", URL), "");
    }
}
