use anyhow::Context;

use crate::model::sirv::{SirvParams, Trajectory, VaccinationRate};

/// Run metadata written above the trajectory table.
#[derive(Debug, Clone)]
pub struct LogHeader<'a> {
    pub run_id: &'a str,
    pub params: SirvParams,
    pub vaccination: VaccinationRate,
    pub t_end: f64,
    pub dt: f64,
}

/// Write `sirv_<run_id>.txt` under `out_dir`: a key=value header, a blank line, then
/// the `t,S,I,R,V` table.
pub fn write_sirv_debug_log(
    out_dir: impl AsRef<std::path::Path>,
    header: &LogHeader<'_>,
    traj: &Trajectory,
) -> anyhow::Result<std::path::PathBuf> {
    use std::io::Write;

    std::fs::create_dir_all(out_dir.as_ref()).context("create logs dir failed")?;
    let path = out_dir.as_ref().join(format!("sirv_{}.txt", header.run_id));
    let mut f = std::fs::File::create(&path)
        .with_context(|| format!("create debug log file failed (path={:?})", path))?;

    writeln!(f, "run_id={}", header.run_id)?;
    writeln!(f, "beta={:.6}", header.params.beta)?;
    writeln!(f, "nu={:.6}", header.params.nu)?;
    match header.vaccination {
        VaccinationRate::Zero => writeln!(f, "vaccination=zero")?,
        VaccinationRate::Step { rate, onset } => {
            writeln!(f, "vaccination=step rate={:.6} onset={:.6}", rate, onset)?
        }
    }
    writeln!(f, "t_end_days={:.6}", header.t_end)?;
    writeln!(f, "dt_days={:.6}", header.dt)?;
    writeln!(f)?;

    let mut wtr = csv::Writer::from_writer(f);
    wtr.write_record(["t", "S", "I", "R", "V"])?;
    for k in 0..traj.len() {
        let s = traj.state_at(k);
        wtr.write_record(&[
            format!("{:.6}", traj.t[k]),
            format!("{:.6}", s.s),
            format!("{:.6}", s.i),
            format!("{:.6}", s.r),
            format!("{:.6}", s.v),
        ])?;
    }
    wtr.flush().with_context(|| format!("flush debug log failed (path={:?})", path))?;

    Ok(path)
}
