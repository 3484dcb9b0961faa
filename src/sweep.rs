//! Vaccination-intensity sweep: one integration and one rendered frame per sweep value.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use plotters::style::RGBColor;
use serde::{Deserialize, Serialize};

use crate::io::manifest::{write_manifest, FrameRecord};
use crate::io::trajectory_log::{write_sirv_debug_log, LogHeader};
use crate::math::grid::logspace;
use crate::math::ode::Method;
use crate::model::sirv::{SirvModel, SirvParams, SirvState, VaccinationRate};
use crate::plot::{Figure, LineHandle, FRAME_EXTENSION};

pub const LEGEND: [&str; 4] = ["S", "I", "R", "V"];

// S red, I blue, R green, V olive yellow
const LINE_COLORS: [RGBColor; 4] = [
    RGBColor(255, 0, 0),
    RGBColor(0, 0, 255),
    RGBColor(0, 128, 0),
    RGBColor(191, 191, 0),
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SweepConfig {
    // Model
    pub beta: f64,
    pub nu: f64,
    pub s0: f64,
    pub i0: f64,

    // Integration (days)
    pub t_end: f64,
    pub dt: f64,
    pub method: Method,

    // Sweep values are 10^x for `p_count` x evenly spaced in [p_start_exp, p_end_exp]
    pub p_start_exp: f64,
    pub p_end_exp: f64,
    pub p_count: usize,
    pub onset: f64,

    // Output
    pub out_dir: PathBuf,
    pub frame_prefix: String,
    pub frame_delay_ms: u64,
    pub figure_size: (u32, u32),
    pub write_trajectories: bool,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            beta: 0.0005,
            nu: 0.1,
            s0: 1500.0,
            i0: 1.0,
            t_end: 60.0,
            dt: 0.5,
            method: Method::Euler,
            p_start_exp: 0.000001,
            p_end_exp: 0.3,
            p_count: 12,
            onset: 8.0,
            out_dir: PathBuf::from("."),
            frame_prefix: "tmp_".to_string(),
            frame_delay_ms: 1000,
            figure_size: (800, 600),
            write_trajectories: false,
        }
    }
}

impl SweepConfig {
    pub fn from_json_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).with_context(|| format!("read sweep config failed (path={:?})", path))?;
        let cfg: Self = serde_json::from_str(&raw).with_context(|| format!("parse sweep config failed (path={:?})", path))?;
        Ok(cfg)
    }

    pub fn check(&self) -> anyhow::Result<()> {
        self.params().check()?;
        anyhow::ensure!(self.s0 > 0.0 && self.i0 > 0.0, "s0 and i0 must be > 0");
        anyhow::ensure!(self.dt > 0.0 && self.t_end >= self.dt, "need 0 < dt <= t_end (dt={}, t_end={})", self.dt, self.t_end);
        anyhow::ensure!(self.p_count >= 1, "p_count must be >= 1");
        anyhow::ensure!(self.p_end_exp > self.p_start_exp || self.p_count == 1, "p_end_exp must exceed p_start_exp");
        anyhow::ensure!(self.figure_size.0 > 0 && self.figure_size.1 > 0, "figure_size must be non-zero");
        Ok(())
    }

    pub fn params(&self) -> SirvParams {
        SirvParams { beta: self.beta, nu: self.nu }
    }

    pub fn initial_state(&self) -> SirvState {
        SirvState::seeded(self.s0, self.i0)
    }

    pub fn sweep_values(&self) -> Vec<f64> {
        logspace(self.p_start_exp, self.p_end_exp, self.p_count)
    }

    /// `<out_dir>/<prefix><frame:04>.<ext>`
    pub fn frame_path(&self, frame: usize) -> PathBuf {
        self.out_dir
            .join(format!("{}{:04}.{}", self.frame_prefix, frame, FRAME_EXTENSION))
    }
}

/// Title shown above each frame; p is the vaccination rate at the end of the horizon.
pub fn frame_title(params: &SirvParams, vaccination: &VaccinationRate, t_end: f64) -> String {
    format!("beta={:.4}, nu={:.1}, p={:.2}", params.beta, params.nu, vaccination.at(t_end))
}

#[derive(Debug, Clone)]
pub struct SweepOutcome {
    pub frames: Vec<FrameRecord>,
    pub manifest: PathBuf,
}

/// Integrate and render a single frame.
///
/// `lines` is `None` on the first call, which creates the four lines; later calls
/// update them in place. Returns the next frame index and the line handles to pass
/// to the following call.
pub fn simulate_frame(
    cfg: &SweepConfig,
    p_value: f64,
    figure: &mut Figure,
    lines: Option<Vec<LineHandle>>,
    frame_counter: usize,
) -> anyhow::Result<(usize, Vec<LineHandle>, FrameRecord)> {
    let params = cfg.params();
    let vaccination = VaccinationRate::log_step(p_value, cfg.onset);
    let rate = vaccination.post_onset_rate();
    if rate < 0.0 {
        log::warn!(
            "frame {}: log10(p)={:.4} is negative, vaccination term adds susceptibles",
            frame_counter,
            rate
        );
    }

    let model = SirvModel::new(params, move |t| vaccination.at(t))?;
    let traj = model
        .simulate(cfg.initial_state(), cfg.t_end, cfg.dt, cfg.method)
        .with_context(|| format!("integration failed for frame {} (p={})", frame_counter, p_value))?;

    let lines = match lines {
        None => {
            let series: Vec<(&[f64], RGBColor)> =
                traj.series().into_iter().zip(LINE_COLORS).collect();
            figure.plot(&traj.t, &series)?
        }
        Some(lines) => {
            for (handle, y) in lines.iter().zip(traj.series()) {
                figure.set_ydata(*handle, y)?;
            }
            lines
        }
    };
    figure.set_legend(&LEGEND);
    figure.set_title(frame_title(&params, &vaccination, cfg.t_end));
    figure.draw()?;

    let image = cfg.frame_path(frame_counter);
    figure.savefig(&image)?;

    if cfg.write_trajectories {
        let run_id = format!("{:04}", frame_counter);
        let header = LogHeader { run_id: &run_id, params, vaccination, t_end: cfg.t_end, dt: cfg.dt };
        write_sirv_debug_log(&cfg.out_dir, &header, &traj)?;
    }

    let final_state = traj.final_state().context("empty trajectory")?;
    let (peak_time, peak_infected) = traj.peak_infected().context("empty trajectory")?;
    log::info!(
        "frame {} saved to {:?} (p={:.4}, rate={:.4}, peak I={:.1} at t={:.1})",
        frame_counter,
        image,
        p_value,
        rate,
        peak_infected,
        peak_time
    );

    let record = FrameRecord {
        frame: frame_counter,
        p_value,
        rate,
        final_state,
        peak_infected,
        peak_time,
        image,
    };
    Ok((frame_counter + 1, lines, record))
}

/// Run the whole sweep, pausing `frame_delay_ms` after each frame, then write `frames.json`.
pub fn run_sweep(cfg: &SweepConfig) -> anyhow::Result<SweepOutcome> {
    cfg.check()?;
    std::fs::create_dir_all(&cfg.out_dir)
        .with_context(|| format!("create output dir failed (path={:?})", cfg.out_dir))?;

    let p_values = cfg.sweep_values();
    log::info!(
        "sweeping {} values of p in [{:.6}, {:.6}] (beta={}, nu={}, t_end={}, dt={})",
        p_values.len(),
        p_values[0],
        p_values[p_values.len() - 1],
        cfg.beta,
        cfg.nu,
        cfg.t_end,
        cfg.dt
    );

    let mut figure = Figure::new(cfg.figure_size.0, cfg.figure_size.1);
    let mut lines = None;
    let mut frame_counter = 0;
    let mut frames = Vec::with_capacity(p_values.len());
    for p_value in p_values {
        let (next, handles, record) = simulate_frame(cfg, p_value, &mut figure, lines, frame_counter)?;
        frame_counter = next;
        lines = Some(handles);
        frames.push(record);

        if cfg.frame_delay_ms > 0 {
            std::thread::sleep(Duration::from_millis(cfg.frame_delay_ms));
        }
    }

    let manifest = write_manifest(&cfg.out_dir, &frames)?;
    log::info!("wrote {} frames, manifest {:?}", frames.len(), manifest);
    Ok(SweepOutcome { frames, manifest })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_demo_constants() {
        let cfg = SweepConfig::default();
        assert_eq!(cfg.params(), SirvParams { beta: 0.0005, nu: 0.1 });
        assert_eq!(cfg.initial_state(), SirvState::seeded(1500.0, 1.0));
        assert_eq!(cfg.sweep_values().len(), 12);
        assert_eq!(cfg.method, Method::Euler);
        assert!(cfg.check().is_ok());
    }

    #[test]
    fn frame_paths_are_zero_padded() {
        let cfg = SweepConfig { out_dir: PathBuf::from("out"), ..SweepConfig::default() };
        assert_eq!(cfg.frame_path(0), PathBuf::from("out").join("tmp_0000.svg"));
        assert_eq!(cfg.frame_path(11), PathBuf::from("out").join("tmp_0011.svg"));
    }

    #[test]
    fn title_reports_rate_at_horizon() {
        let params = SirvParams { beta: 0.0005, nu: 0.1 };
        let p = VaccinationRate::log_step(100.0, 8.0);
        assert_eq!(frame_title(&params, &p, 60.0), "beta=0.0005, nu=0.1, p=2.00");
        assert_eq!(frame_title(&params, &VaccinationRate::Zero, 60.0), "beta=0.0005, nu=0.1, p=0.00");
    }

    #[test]
    fn partial_json_config_uses_defaults() {
        let cfg: SweepConfig = serde_json::from_str(r#"{"p_count": 3, "frame_delay_ms": 0}"#).unwrap();
        assert_eq!(cfg.p_count, 3);
        assert_eq!(cfg.frame_delay_ms, 0);
        assert_eq!(cfg.beta, 0.0005);
        assert_eq!(cfg.frame_prefix, "tmp_");
    }

    fn scratch_config(out_dir: &Path) -> SweepConfig {
        SweepConfig {
            out_dir: out_dir.to_path_buf(),
            frame_delay_ms: 0,
            figure_size: (400, 300),
            ..SweepConfig::default()
        }
    }

    #[test]
    fn second_frame_updates_the_same_lines() {
        let tmp = tempfile::tempdir().unwrap();
        let cfg = scratch_config(tmp.path());
        let mut figure = Figure::new(400, 300);

        let (next, first, _) = simulate_frame(&cfg, 1.2, &mut figure, None, 0).unwrap();
        assert_eq!(next, 1);
        assert_eq!(first.len(), 4);

        let (next, second, record) = simulate_frame(&cfg, 1.9, &mut figure, Some(first.clone()), next).unwrap();
        assert_eq!(next, 2);
        assert_eq!(record.frame, 1);
        assert_eq!(second, first);

        // No fifth line was added behind the handles
        assert!(figure.ydata(LineHandle::from_index(4)).is_none());

        let model = SirvModel::new(cfg.params(), |t| VaccinationRate::log_step(1.9, cfg.onset).at(t)).unwrap();
        let traj = model.simulate(cfg.initial_state(), cfg.t_end, cfg.dt, cfg.method).unwrap();
        for (handle, expected) in second.iter().zip(traj.series()) {
            assert_eq!(figure.ydata(*handle).unwrap(), expected);
        }
        assert!(figure.canvas().contains("p=0.28"));
    }

    #[test]
    fn p_below_one_reports_negative_rate_even_before_onset() {
        let tmp = tempfile::tempdir().unwrap();
        let mut figure = Figure::new(400, 300);

        let cfg = scratch_config(tmp.path());
        let (_, _, record) = simulate_frame(&cfg, 0.5, &mut figure, None, 0).unwrap();
        assert!(record.rate < 0.0);
        assert!((record.rate - 0.5f64.log10()).abs() < 1e-15);
        // Negative rate moves mass from V back into S
        assert!(record.final_state.v < 0.0);

        let late = SweepConfig { onset: 100.0, ..scratch_config(tmp.path()) };
        let mut figure = Figure::new(400, 300);
        let (_, _, record) = simulate_frame(&late, 0.5, &mut figure, None, 0).unwrap();
        assert!(record.rate < 0.0);
        assert_eq!(record.final_state.v, 0.0);
    }

    #[test]
    fn invalid_config_is_rejected() {
        let cfg = SweepConfig { p_count: 0, ..SweepConfig::default() };
        assert!(cfg.check().is_err());
        let cfg = SweepConfig { dt: 0.0, frame_delay_ms: 0, ..SweepConfig::default() };
        assert!(run_sweep(&cfg).is_err());
    }
}
