//! Run artifacts and their atomic publication.
//!
//! Every file of a run is written into a private staging directory inside
//! the output directory first. Only when all of them exist are they renamed
//! into place, so a reader never sees a half-written `image.bin` and a failed
//! run leaves the previous artifacts untouched. Dropping a [`StagingArea`]
//! removes whatever was not published.

use std::io::{self, Cursor};
use std::path::{Path, PathBuf};

use chrono::{SecondsFormat, Utc};
use image::ImageFormat;
use panel_encode::{render_header, ColorStatistics, IndexStream};
use serde::{Deserialize, Serialize};
use tempfile::TempDir;
use utoipa::ToSchema;

pub const BINARY_FILE: &str = "image.bin";
pub const HEADER_FILE: &str = "image.h";
pub const STATS_FILE: &str = "stats.json";
pub const PREVIEW_FILE: &str = "preview.png";

/// Contents of stats.json
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct StatsDocument {
    /// Content hash of the uploaded image
    pub run_id: String,
    /// RFC 3339 timestamp of the run
    pub generated_at: String,
    /// Number of panel pixels
    pub total_pixels: usize,
    /// One entry per palette color, sorted by hardware index
    pub colors: Vec<ColorEntry>,
}

/// Usage of a single palette color
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ColorEntry {
    pub name: String,
    pub index: u8,
    pub count: usize,
    pub percentage: f64,
}

impl StatsDocument {
    pub fn new(run_id: &str, stats: &ColorStatistics) -> Self {
        Self {
            run_id: run_id.to_string(),
            generated_at: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
            total_pixels: stats.total(),
            colors: stats
                .colors()
                .iter()
                .map(|usage| ColorEntry {
                    name: usage.name().to_string(),
                    index: usage.index(),
                    count: usage.count,
                    percentage: usage.percentage,
                })
                .collect(),
        }
    }
}

/// Per-run scratch directory next to the published artifacts.
pub struct StagingArea {
    dir: TempDir,
    output_dir: PathBuf,
    staged: Vec<&'static str>,
}

impl StagingArea {
    /// Create the output directory if needed and a fresh staging directory inside it.
    pub fn create(output_dir: &Path) -> io::Result<Self> {
        std::fs::create_dir_all(output_dir)?;
        let dir = tempfile::Builder::new()
            .prefix(".staging-")
            .tempdir_in(output_dir)?;
        tracing::debug!(staging = %dir.path().display(), "Created staging directory");

        Ok(Self {
            dir,
            output_dir: output_dir.to_path_buf(),
            staged: Vec::new(),
        })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Write one artifact into the staging directory.
    pub fn write(&mut self, name: &'static str, contents: &[u8]) -> io::Result<()> {
        std::fs::write(self.dir.path().join(name), contents)?;
        self.staged.push(name);
        Ok(())
    }

    /// Rename every staged artifact into the output directory.
    ///
    /// Files are published in staging order. A target that cannot be
    /// replaced fails the commit before anything is renamed. Artifacts
    /// being replaced are moved into the staging directory first and put
    /// back if a later rename fails, so the output directory holds either
    /// the previous set or the new one. Returns the final paths.
    pub fn commit(self) -> io::Result<Vec<PathBuf>> {
        for name in &self.staged {
            let target = self.output_dir.join(name);
            if let Ok(meta) = std::fs::symlink_metadata(&target) {
                if meta.is_dir() {
                    return Err(io::Error::other(format!(
                        "{} is a directory",
                        target.display()
                    )));
                }
            }
        }

        let mut published: Vec<Published> = Vec::with_capacity(self.staged.len());
        for name in &self.staged {
            match self.publish(name) {
                Ok(entry) => published.push(entry),
                Err(e) => {
                    roll_back(&published);
                    return Err(e);
                }
            }
        }
        // self.dir dropped here, removing replaced artifacts with it
        Ok(published.into_iter().map(|entry| entry.target).collect())
    }

    fn publish(&self, name: &str) -> io::Result<Published> {
        let target = self.output_dir.join(name);
        let backup = match std::fs::symlink_metadata(&target) {
            Ok(_) => {
                let backup = self.dir.path().join(format!("{name}.previous"));
                std::fs::rename(&target, &backup)?;
                Some(backup)
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => None,
            Err(e) => return Err(e),
        };

        if let Err(e) = std::fs::rename(self.dir.path().join(name), &target) {
            if let Some(backup) = &backup {
                restore(backup, &target);
            }
            return Err(e);
        }
        Ok(Published { target, backup })
    }
}

/// An artifact renamed into place and what it replaced.
struct Published {
    target: PathBuf,
    backup: Option<PathBuf>,
}

fn roll_back(published: &[Published]) {
    for entry in published.iter().rev() {
        match &entry.backup {
            Some(backup) => restore(backup, &entry.target),
            None => {
                if let Err(e) = std::fs::remove_file(&entry.target) {
                    tracing::error!(path = %entry.target.display(), error = %e, "Failed to withdraw artifact");
                }
            }
        }
    }
    tracing::warn!(restored = published.len(), "Rolled back partial commit");
}

fn restore(backup: &Path, target: &Path) {
    if let Err(e) = std::fs::rename(backup, target) {
        tracing::error!(path = %target.display(), error = %e, "Failed to restore previous artifact");
    }
}

/// Everything a finished run publishes.
pub struct Artifacts<'a> {
    pub stream: &'a IndexStream,
    pub packed: &'a [u8],
    pub stats: &'a StatsDocument,
    pub preview: bool,
}

impl Artifacts<'_> {
    /// Stage all artifacts. The binary goes last so it is also published last.
    pub fn stage(&self, staging: &mut StagingArea) -> io::Result<()> {
        staging.write(HEADER_FILE, render_header(self.stream).as_bytes())?;

        let json = serde_json::to_vec_pretty(self.stats).map_err(io::Error::other)?;
        staging.write(STATS_FILE, &json)?;

        if self.preview {
            staging.write(PREVIEW_FILE, &render_preview(self.stream)?)?;
        }

        staging.write(BINARY_FILE, self.packed)
    }
}

/// PNG of the stream in nominal palette colors.
pub fn render_preview(stream: &IndexStream) -> io::Result<Vec<u8>> {
    let img = stream.to_rgb().ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::InvalidData,
            "index stream does not match its dimensions",
        )
    })?;

    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
        .map_err(io::Error::other)?;
    Ok(buf)
}
