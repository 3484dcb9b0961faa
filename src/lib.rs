pub mod io;
pub mod logging;
pub mod math;
pub mod model;
pub mod plot;
pub mod sweep;

pub use model::sirv::{SirvModel, SirvParams, SirvState, Trajectory, VaccinationRate};
pub use sweep::{run_sweep, SweepConfig, SweepOutcome};
