//! Frame dump for an external encoder.
//!
//! Writes one manifest line followed by one JSON document per frame (NDJSON).
//! Turning the dump into a video or GIF is the encoder's job, not ours.

use crate::animator::Animator;
use crate::config::AppConfig;
use crate::models::Dataset;
use anyhow::{Context, Result};
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::info;

/// First line of the dump: everything the encoder needs to pace playback.
#[derive(Debug, Serialize)]
struct Manifest<'a> {
    frame_count: usize,
    tick_interval_ms: u64,
    fps: u32,
    companies: Vec<&'a str>,
}

/// Render every frame and dump the sequence to `export.out_path`.
pub fn write_frames(dataset: &Dataset, cfg: &AppConfig) -> Result<PathBuf> {
    write_frames_to(dataset, cfg, &cfg.export.out_path)
}

pub fn write_frames_to(dataset: &Dataset, cfg: &AppConfig, out_path: &Path) -> Result<PathBuf> {
    let animator = Animator::new(dataset, cfg.animation.frame_count);

    if let Some(parent) = out_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Could not create dir {:?}", parent))?;
    }

    let file = File::create(out_path)
        .with_context(|| format!("Could not create frame dump {:?}", out_path))?;
    let mut out = BufWriter::new(file);

    let manifest = Manifest {
        frame_count: animator.frame_count(),
        tick_interval_ms: cfg.animation.tick_interval_ms,
        fps: cfg.export.fps,
        companies: dataset.companies.iter().map(|c| c.name.as_str()).collect(),
    };
    serde_json::to_writer(&mut out, &manifest)?;
    out.write_all(b"\n")?;

    for frame in 0..animator.frame_count() {
        serde_json::to_writer(&mut out, &animator.frame_state(frame))?;
        out.write_all(b"\n")?;
    }

    out.flush()?;
    info!(
        "Exported {} frames to {:?}",
        animator.frame_count(),
        out_path
    );

    Ok(out_path.to_path_buf())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
