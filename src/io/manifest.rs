use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::model::sirv::SirvState;

/// Summary of one rendered frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameRecord {
    pub frame: usize,
    pub p_value: f64,
    /// Vaccination rate in effect after onset.
    pub rate: f64,
    pub final_state: SirvState,
    pub peak_infected: f64,
    pub peak_time: f64,
    pub image: std::path::PathBuf,
}

/// Write the frame records as pretty JSON to `<out_dir>/frames.json`.
pub fn write_manifest(
    out_dir: impl AsRef<std::path::Path>,
    frames: &[FrameRecord],
) -> anyhow::Result<std::path::PathBuf> {
    std::fs::create_dir_all(out_dir.as_ref()).context("create output dir failed")?;
    let path = out_dir.as_ref().join("frames.json");
    let f = std::fs::File::create(&path)
        .with_context(|| format!("create manifest failed (path={:?})", path))?;
    serde_json::to_writer_pretty(f, frames)
        .with_context(|| format!("write manifest failed (path={:?})", path))?;
    Ok(path)
}

pub fn read_manifest(path: impl AsRef<std::path::Path>) -> anyhow::Result<Vec<FrameRecord>> {
    let path = path.as_ref();
    let f = std::fs::File::open(path).with_context(|| format!("open manifest failed (path={:?})", path))?;
    let frames = serde_json::from_reader(std::io::BufReader::new(f))
        .with_context(|| format!("parse manifest failed (path={:?})", path))?;
    Ok(frames)
}
