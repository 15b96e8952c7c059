pub mod assessment;
pub mod drills;
pub mod skill_tracking;
