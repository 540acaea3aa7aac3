//! Extended M3U parsing for IPTV-style playlists.
//!
//! Recognised lines:
//!
//! - `#EXTM3U [key="value" ...]` header (must be the first non-blank line)
//! - `#EXTINF:<duration> [key="value" ...],<name>` opens an entry
//! - `#EXTVLCOPT:http-referrer=...` / `#EXTVLCOPT:http-user-agent=...`
//! - `#EXTGRP:<group>`
//! - the first non-comment line after `#EXTINF` is the stream URL
//!
//! Unknown directives inside an entry are preserved in `raw` but otherwise ignored.

use std::collections::BTreeMap;

use thiserror::Error;

use super::{Playlist, PlaylistHeader, PlaylistItem};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("Playlist is missing the #EXTM3U header")]
    MissingHeader,
}

pub fn parse(text: &str) -> Result<Playlist, ParseError> {
    let mut lines = text
        .trim_start_matches('\u{feff}')
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty());

    let header_line = lines.next().ok_or(ParseError::MissingHeader)?;
    let header_rest = header_line
        .strip_prefix("#EXTM3U")
        .ok_or(ParseError::MissingHeader)?;

    let header = PlaylistHeader {
        attrs: parse_attributes(header_rest).into_iter().collect::<BTreeMap<_, _>>(),
        raw: header_line.to_string(),
    };

    let mut items = Vec::new();
    let mut pending: Option<PlaylistItem> = None;

    for line in lines {
        if let Some(info) = line.strip_prefix("#EXTINF:") {
            // A new #EXTINF without a URL drops the previous entry.
            pending = Some(parse_extinf(info, line));
            continue;
        }

        if line.starts_with('#') {
            if let Some(item) = pending.as_mut() {
                apply_directive(item, line);
                item.raw.push('\n');
                item.raw.push_str(line);
            }
            continue;
        }

        let mut item = pending.take().unwrap_or_default();
        if !item.raw.is_empty() {
            item.raw.push('\n');
        }
        item.raw.push_str(line);
        item.url = line.to_string();
        items.push(item);
    }

    Ok(Playlist { header, items })
}

fn parse_extinf(info: &str, line: &str) -> PlaylistItem {
    let (head, name) = split_unquoted_comma(info);
    let attrs_str = head
        .trim_start()
        .split_once(char::is_whitespace)
        .map(|(_duration, rest)| rest)
        .unwrap_or("");

    let mut item = PlaylistItem {
        name: name.trim().to_string(),
        raw: line.to_string(),
        ..Default::default()
    };

    for (key, value) in parse_attributes(attrs_str) {
        match key.as_str() {
            "tvg-id" => item.tvg.id = value,
            "tvg-name" => item.tvg.name = value,
            "tvg-logo" => item.tvg.logo = value,
            "tvg-url" => item.tvg.url = value,
            "group-title" => item.group_title = value,
            "http-referrer" => item.http.referrer = value,
            "http-user-agent" | "user-agent" => item.http.user_agent = value,
            _ => {}
        }
    }
    item
}

fn apply_directive(item: &mut PlaylistItem, line: &str) {
    if let Some(opt) = line.strip_prefix("#EXTVLCOPT:") {
        if let Some((key, value)) = opt.split_once('=') {
            match key.trim() {
                "http-referrer" => item.http.referrer = value.trim().to_string(),
                "http-user-agent" => item.http.user_agent = value.trim().to_string(),
                _ => {}
            }
        }
    } else if let Some(group) = line.strip_prefix("#EXTGRP:") {
        if item.group_title.is_empty() {
            item.group_title = group.trim().to_string();
        }
    }
}

/// Split at the first comma that is not inside double quotes.
fn split_unquoted_comma(s: &str) -> (&str, &str) {
    let mut in_quotes = false;
    for (i, c) in s.char_indices() {
        match c {
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => return (&s[..i], &s[i + 1..]),
            _ => {}
        }
    }
    (s, "")
}

fn parse_attributes(s: &str) -> Vec<(String, String)> {
    let mut attrs = Vec::new();
    let mut rest = s.trim_start();

    while !rest.is_empty() {
        let key_end = rest
            .find(|c: char| c == '=' || c.is_whitespace())
            .unwrap_or(rest.len());
        let key = &rest[..key_end];
        rest = &rest[key_end..];

        let Some(after_eq) = rest.strip_prefix('=') else {
            rest = rest.trim_start();
            continue;
        };

        let (value, remainder) = if let Some(quoted) = after_eq.strip_prefix('"') {
            match quoted.find('"') {
                Some(end) => (&quoted[..end], &quoted[end + 1..]),
                None => (quoted, ""),
            }
        } else {
            let end = after_eq.find(char::is_whitespace).unwrap_or(after_eq.len());
            (&after_eq[..end], &after_eq[end..])
        };

        if !key.is_empty() {
            attrs.push((key.to_string(), value.to_string()));
        }
        rest = remainder.trim_start();
    }

    attrs
}
