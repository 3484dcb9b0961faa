use std::time::Instant;

use sirv::math::ode::Method;
use sirv::model::sirv::{SirvModel, SirvParams, SirvState, VaccinationRate};

fn main() -> anyhow::Result<()> {
    let params = SirvParams { beta: 0.0005, nu: 0.1 };
    let vaccination = VaccinationRate::log_step(10f64.powf(0.3), 8.0);
    let model = SirvModel::new(params, move |t| vaccination.at(t))?;
    let u0 = SirvState::seeded(1500.0, 1.0);

    // Fine RK4 run as reference
    let reference = model.simulate(u0, 60.0, 0.001, Method::Rk4)?;
    let exact = reference.final_state().map(|s| s.i).unwrap_or(f64::NAN);

    println!("method,dt,I_end,abs_err,ms");
    for method in [Method::Euler, Method::Rk4] {
        for dt in [1.0, 0.5, 0.25, 0.125] {
            let start = Instant::now();
            let traj = model.simulate(u0, 60.0, dt, method)?;
            let ms = start.elapsed().as_secs_f64() * 1000.0;
            let i_end = traj.final_state().map(|s| s.i).unwrap_or(f64::NAN);
            println!("{:?},{},{:.6},{:.3e},{:.3}", method, dt, i_end, (i_end - exact).abs(), ms);
        }
    }

    Ok(())
}
