pub mod commission_schedule;

pub use commission_schedule::CommissionSchedule;
