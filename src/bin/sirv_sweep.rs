use std::env::VarError;

use anyhow::Context;

use sirv::logging;
use sirv::{run_sweep, SweepConfig};

/// Value of an optional environment override. Unset is `None`; a value that is not
/// valid UTF-8 is an error rather than a silent fallback to the default.
fn env_override(name: &str) -> anyhow::Result<Option<String>> {
    match std::env::var(name) {
        Ok(v) => Ok(Some(v)),
        Err(VarError::NotPresent) => Ok(None),
        Err(e @ VarError::NotUnicode(_)) => Err(e).with_context(|| format!("invalid {}", name)),
    }
}

fn main() -> anyhow::Result<()> {
    logging::init_default();

    let mut cfg = match env_override("SIRV_CONFIG")? {
        Some(path) => SweepConfig::from_json_file(&path)?,
        None => SweepConfig::default(),
    };

    if let Some(dir) = env_override("SIRV_OUT_DIR")? {
        cfg.out_dir = dir.into();
    }
    if let Some(ms) = env_override("SIRV_FRAME_DELAY_MS")? {
        cfg.frame_delay_ms = ms
            .parse()
            .with_context(|| format!("invalid SIRV_FRAME_DELAY_MS: {:?}", ms))?;
    }

    let outcome = run_sweep(&cfg)?;

    println!("frame,p,rate,S_end,I_end,R_end,V_end,peak_I,peak_t");
    for f in &outcome.frames {
        let s = &f.final_state;
        println!(
            "{},{:.6},{:.6},{:.3},{:.3},{:.3},{:.3},{:.3},{:.1}",
            f.frame, f.p_value, f.rate, s.s, s.i, s.r, s.v, f.peak_infected, f.peak_time
        );
    }

    Ok(())
}
