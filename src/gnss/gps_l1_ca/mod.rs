
use crate::AcqErr;

pub mod signal_modulation;

pub const CODE_LENGTH:usize = 1023;
pub const CODE_FREQ_BASIS_HZ:f64 = 1.023e6;

/// Highest PRN with an entry in the G2 shift table
pub const MAX_PRN:usize = 32;

pub fn check_prn(prn:usize) -> Result<(), AcqErr> {
	if prn >= 1 && prn <= MAX_PRN { Ok(()) }
	else { Err(AcqErr::InvalidParameter("PRN must be between 1 and 32")) }
}
