
use crate::AcqErr;

/// Correlation power over (frequency bin, code phase sample), stored row-major with one row per frequency bin
#[derive(Debug, Clone, PartialEq)]
pub struct SearchSpace {
	n_freq_bins:usize,
	samples_per_code:usize,
	data:Vec<f64>,
}

impl SearchSpace {

	pub fn new(n_freq_bins:usize, samples_per_code:usize) -> Result<Self, AcqErr> {
		if n_freq_bins == 0 || samples_per_code == 0 { return Err(AcqErr::InvalidParameter("Search space must have at least one cell")); }
		Ok(Self{ n_freq_bins, samples_per_code, data: vec![0.0; n_freq_bins * samples_per_code] })
	}

	pub fn n_freq_bins(&self) -> usize { self.n_freq_bins }
	pub fn samples_per_code(&self) -> usize { self.samples_per_code }
	pub fn shape(&self) -> (usize, usize) { (self.n_freq_bins, self.samples_per_code) }

	/// Power for every code phase of one frequency bin.
	///
	/// Panics if `freq_bin` is outside of the search space, like slice indexing; use `try_row` to check instead.
	pub fn row(&self, freq_bin:usize) -> &[f64] {
		let start = freq_bin * self.samples_per_code;
		&self.data[start..(start + self.samples_per_code)]
	}

	pub fn try_row(&self, freq_bin:usize) -> Option<&[f64]> {
		if freq_bin < self.n_freq_bins { Some(self.row(freq_bin)) } else { None }
	}

	pub fn rows(&self) -> std::slice::Chunks<'_, f64> { self.data.chunks(self.samples_per_code) }

	/// Panics if either index is outside of the search space; use `try_get` to check instead
	pub fn get(&self, freq_bin:usize, code_phase:usize) -> f64 { self.row(freq_bin)[code_phase] }

	pub fn try_get(&self, freq_bin:usize, code_phase:usize) -> Option<f64> {
		self.try_row(freq_bin).and_then(|row| row.get(code_phase).cloned())
	}

	pub fn set_row(&mut self, freq_bin:usize, row:&[f64]) -> Result<(), AcqErr> {
		if freq_bin >= self.n_freq_bins      { return Err(AcqErr::ShapeMismatch("Frequency bin outside of the search space")); }
		if row.len() != self.samples_per_code { return Err(AcqErr::ShapeMismatch("Row length doesn't match samples per code")); }
		let start = freq_bin * self.samples_per_code;
		self.data[start..(start + self.samples_per_code)].copy_from_slice(row);
		Ok(())
	}

	/// Largest cell and its (frequency bin, code phase).  Ties go to the first cell in row-major order.
	pub fn global_max(&self) -> (f64, usize, usize) {
		let mut best:(f64, usize) = (self.data[0], 0);
		for (idx, p) in self.data.iter().enumerate() {
			if *p > best.0 { best = (*p, idx); }
		}
		(best.0, best.1 / self.samples_per_code, best.1 % self.samples_per_code)
	}

}
