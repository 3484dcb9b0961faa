pub mod grid;
pub mod ode;
