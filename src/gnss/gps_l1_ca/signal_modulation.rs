
use crate::AcqErr;
use super::{CODE_LENGTH, check_prn};

// G2 delay in chips for PRN 1 through 32, given in IS-GPS-200, Table 3-Ia
const G2_SHIFT:[usize; 32] = [
	  5,   6,   7,   8,  17,  18, 139, 140, 141, 251, 252, 254, 255, 256, 257, 258,
	469, 470, 471, 472, 473, 474, 509, 512, 513, 514, 515, 516, 859, 860, 861, 862 ];

// Register taps, zero-indexed; the output is always the last stage
const G1_TAPS:[usize; 2] = [2, 9];
const G2_TAPS:[usize; 6] = [1, 2, 5, 7, 8, 9];

// One full period of a 10-stage maximal-length register in the +1/-1 domain, where the product of
// two stages is their exclusive-or.  Every stage starts at -1 (logical one).
fn lfsr_sequence(taps:&[usize]) -> [i8; CODE_LENGTH] {
	let mut ans:[i8; CODE_LENGTH] = [0; CODE_LENGTH];
	let mut reg:[i8; 10] = [-1; 10];
	for idx in 0..CODE_LENGTH {
		ans[idx] = reg[9];
		let feedback:i8 = taps.iter().map(|t| reg[*t]).product();
		reg.rotate_right(1);
		reg[0] = feedback;
	}
	ans
}

/// The 1023-chip C/A code for the given PRN with values in {+1, -1}
pub fn prn_int(prn:usize) -> Result<Vec<i8>, AcqErr> {
	check_prn(prn)?;

	let g1 = lfsr_sequence(&G1_TAPS);
	let g2 = lfsr_sequence(&G2_TAPS);
	let shift:usize = G2_SHIFT[prn-1];

	Ok((0..CODE_LENGTH).map(|idx| -(g1[idx] * g2[(idx + CODE_LENGTH - shift) % CODE_LENGTH])).collect())
}

/// Index of the chip that covers sample `idx` of a code period sampled at `fs`.  The last sample of the
/// period is pinned to the last chip so rounding at the boundary can't run past the end of the code.
pub fn code_sample_index(idx:usize, samples_per_code:usize, fs:f64, code_freq_hz:f64) -> usize {
	if idx + 1 >= samples_per_code { return CODE_LENGTH - 1; }

	// Equivalent to ceil(ts*(idx+1) / tc) - 1, but multiplying first keeps exact ratios exact
	let chip:f64 = ((idx + 1) as f64 * code_freq_hz / fs).ceil();
	if chip < 1.0 { 0 } else { (chip as usize - 1).min(CODE_LENGTH - 1) }
}

/// The C/A code upsampled to `samples_per_code` samples by nearest-chip lookup
pub fn prn_int_sampled(prn:usize, samples_per_code:usize, fs:f64, code_freq_hz:f64) -> Result<Vec<i8>, AcqErr> {
	let code = prn_int(prn)?;
	Ok((0..samples_per_code).map(|idx| code[code_sample_index(idx, samples_per_code, fs, code_freq_hz)]).collect())
}
