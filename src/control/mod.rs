pub mod pid;
pub mod rotation;
pub mod velocity;

pub use pid::{DutyPid, PidGains};
pub use rotation::RotationBudget;
pub use velocity::VelocityEstimator;
