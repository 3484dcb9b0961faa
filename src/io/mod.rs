pub mod manifest;
pub mod trajectory_log;
