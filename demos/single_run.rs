use sirv::math::ode::Method;
use sirv::model::sirv::{SirvModel, SirvParams, SirvState, VaccinationRate};
use sirv::plot::Figure;
use sirv::sweep::{frame_title, LEGEND};

use plotters::style::{BLUE, GREEN, RED, RGBColor};

fn main() -> anyhow::Result<()> {
    sirv::logging::init_default();

    let params = SirvParams { beta: 0.0005, nu: 0.1 };
    // Vaccinate 10% of susceptibles per day from day 8
    let vaccination = VaccinationRate::Step { rate: 0.1, onset: 8.0 };
    let model = SirvModel::new(params, move |t| vaccination.at(t))?;

    let t_end = 60.0;
    let traj = model.simulate(SirvState::seeded(1500.0, 1.0), t_end, 0.5, Method::Euler)?;

    // Print daily summary (every 2 steps)
    println!("day,S,I,R,V");
    for k in (0..traj.len()).step_by(2) {
        let s = traj.state_at(k);
        println!("{:.0},{:.1},{:.1},{:.1},{:.1}", traj.t[k], s.s, s.i, s.r, s.v);
    }

    let colors = [RED, BLUE, GREEN, RGBColor(191, 191, 0)];
    let series: Vec<(&[f64], RGBColor)> = traj.series().into_iter().zip(colors).collect();
    let mut fig = Figure::new(800, 600);
    fig.plot(&traj.t, &series)?;
    fig.set_legend(&LEGEND);
    fig.set_title(frame_title(&params, &vaccination, t_end));
    fig.savefig("single_run.svg")?;

    Ok(())
}
