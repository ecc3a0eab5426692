
/// Functionality common to all signals; at the moment only acquisition lives here
pub mod common;

pub mod gps_l1_ca;
