pub mod commission;

pub use commission::{Commission, CommissionRow, CommissionSplit, CommissionStatus};
