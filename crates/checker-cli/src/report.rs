//! Writes the per-status M3U files for a checked playlist.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use checker_core::{ItemReport, ItemStatus, Playlist};

pub const ONLINE_FILE: &str = "online.m3u";
pub const OFFLINE_FILE: &str = "offline.m3u";
pub const DUPLICATES_FILE: &str = "duplicates.m3u";

/// Output directory for one input: `<root>/<file stem>`, or `<root>/playlist_<n>`
/// when the input has no usable stem (raw text, bare host URLs).
pub fn output_dir_for(root: &Path, input: &str, position: usize) -> PathBuf {
    let is_raw_text = input.contains('\n') || input.trim_start().starts_with('#');
    let stem = Some(input)
        .filter(|_| !is_raw_text)
        .and_then(|i| i.rsplit(['/', '\\']).next())
        .and_then(|name| Path::new(name).file_stem())
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| format!("playlist_{}", position + 1));
    root.join(stem)
}

/// Hands out one distinct output directory per input of a run. A name that is
/// already taken gets a `_<n>` suffix, starting from the input's 1-based position.
#[derive(Debug)]
pub struct OutputDirs {
    root: PathBuf,
    used: HashSet<PathBuf>,
}

impl OutputDirs {
    pub fn new(root: PathBuf) -> Self {
        Self {
            root,
            used: HashSet::new(),
        }
    }

    pub fn assign(&mut self, input: &str, position: usize) -> PathBuf {
        let base = output_dir_for(&self.root, input, position);
        let mut dir = base.clone();
        let mut n = position + 1;
        while self.used.contains(&dir) {
            let name = base.file_name().and_then(|s| s.to_str()).unwrap_or("playlist");
            dir = self.root.join(format!("{}_{}", name, n));
            n += 1;
        }
        self.used.insert(dir.clone());
        dir
    }
}

pub fn write_reports(dir: &Path, playlist: &Playlist, reports: &[ItemReport]) -> std::io::Result<()> {
    std::fs::create_dir_all(dir)?;

    let select = |want: fn(&ItemStatus) -> bool| {
        playlist.render(reports.iter().filter(|r| want(&r.status)).map(|r| &r.item))
    };

    std::fs::write(
        dir.join(ONLINE_FILE),
        select(|s| matches!(s, ItemStatus::Online { .. })),
    )?;
    std::fs::write(
        dir.join(OFFLINE_FILE),
        select(|s| matches!(s, ItemStatus::Offline { .. })),
    )?;
    std::fs::write(
        dir.join(DUPLICATES_FILE),
        select(|s| matches!(s, ItemStatus::Duplicate)),
    )?;
    Ok(())
}
