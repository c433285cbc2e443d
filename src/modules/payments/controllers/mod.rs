pub mod payment_controller;
pub mod webhook_controller;

pub use payment_controller::{configure, render_return_page, ReturnPageSettings};
