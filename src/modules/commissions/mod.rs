pub mod models;
pub mod repositories;
pub mod services;

pub use models::{Commission, CommissionSplit, CommissionStatus};
pub use repositories::{CommissionRepository, MySqlCommissionRepository};
pub use services::CommissionSchedule;
