pub mod payment;

pub use payment::{
    generate_transaction_ref, EarningsStatus, NewPayment, Payment, PaymentRow, PaymentStatus,
};
