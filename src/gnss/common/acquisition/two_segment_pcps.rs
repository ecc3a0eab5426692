
use std::f64::consts;
use std::sync::Arc;

use rustfft::{FFT, FFTplanner};
use num_complex::Complex;
use num_traits::Zero;

use crate::AcqErr;
use crate::settings::CarrierWipeoff;
use super::replica::Replica;
use super::search_space::SearchSpace;

/// Parallel code phase search over two consecutive, non-overlapping code periods of a real-valued signal.
/// For every Doppler hypothesis, whichever segment produces the stronger correlation peak is kept, so a
/// navigation bit transition inside one of the segments can't wash out the result.
///
/// FFT plans and work buffers are owned by this struct and released when it goes out of scope.
pub struct Correlator {
	pub fs:f64,
	pub len_fft:usize,
	pub wipeoff:CarrierWipeoff,
	fft:Arc<dyn FFT<f64>>,
	ifft:Arc<dyn FFT<f64>>,
	wiped:  [Vec<Complex<f64>>; 2],
	power:  [Vec<f64>; 2],
	fft_out:  Vec<Complex<f64>>,
	ifft_out: Vec<Complex<f64>>,
}

impl Correlator {

	pub fn new(len_fft:usize, fs:f64, wipeoff:CarrierWipeoff) -> Self {
		let mut planner = FFTplanner::new(false);
		let fft = planner.plan_fft(len_fft);

		let mut inv_planner = FFTplanner::new(true);
		let ifft = inv_planner.plan_fft(len_fft);

		let wiped = [vec![Complex::zero(); len_fft], vec![Complex::zero(); len_fft]];
		let power = [vec![0.0; len_fft], vec![0.0; len_fft]];

		Correlator{ fs, len_fft, wipeoff, fft, ifft, wiped, power,
			fft_out: vec![Complex::zero(); len_fft], ifft_out: vec![Complex::zero(); len_fft] }
	}

	/// Fill one row of the search space for every entry in `freq_bins_hz`, which are absolute carrier
	/// frequencies (IF plus Doppler)
	pub fn search(&mut self, signal1:&[f64], signal2:&[f64], replica:&Replica, freq_bins_hz:&[f64]) -> Result<SearchSpace, AcqErr> {
		let n = self.len_fft;
		if signal1.len() != n || signal2.len() != n { return Err(AcqErr::ShapeMismatch("Signal segments must be one code period long")); }
		if replica.len() != n || replica.freq_domain.len() != n { return Err(AcqErr::ShapeMismatch("Replica must be one code period long")); }

		let mut search_space = SearchSpace::new(freq_bins_hz.len(), n)?;

		for (freq_bin, freq) in freq_bins_hz.iter().enumerate() {
			self.wipe_off_carrier(*freq, signal1, signal2);

			let max0 = self.correlate(0, &replica.freq_domain);
			let max1 = self.correlate(1, &replica.freq_domain);

			let stronger:usize = if max0 > max1 { 0 } else { 1 };
			search_space.set_row(freq_bin, &self.power[stronger])?;
		}

		Ok(search_space)
	}

	// Multiply both segments by local sine and cosine carriers.  The same phase points are used for both.
	fn wipe_off_carrier(&mut self, freq:f64, signal1:&[f64], signal2:&[f64]) {
		let phase_step_rad:f64 = (2.0 * consts::PI * freq) / self.fs;
		for idx in 0..self.len_fft {
			let (sin, cos) = (phase_step_rad * (idx as f64)).sin_cos();
			match self.wipeoff {
				CarrierWipeoff::Complex => {
					self.wiped[0][idx] = Complex{ re: sin * signal1[idx], im: cos * signal1[idx] };
					self.wiped[1][idx] = Complex{ re: sin * signal2[idx], im: cos * signal2[idx] };
				},
				CarrierWipeoff::InPhase => {
					self.wiped[0][idx] = Complex{ re: sin * signal1[idx], im: 0.0 };
					self.wiped[1][idx] = Complex{ re: sin * signal2[idx], im: 0.0 };
				},
			}
		}
	}

	// Circular correlation of one wiped segment against the replica; leaves |r|^2 in self.power[seg]
	// and returns its maximum
	fn correlate(&mut self, seg:usize, local_code_freq_domain:&[Complex<f64>]) -> f64 {
		// Run the forward FFT
		self.fft.process(&mut self.wiped[seg], &mut self.fft_out);

		// Multiplication in the freq domain against the conjugated replica is correlation in the time domain
		for (a, b) in self.fft_out.iter_mut().zip(local_code_freq_domain.iter()) {
			*a = *a * *b;
		}

		// Run the inverse FFT to get correlation in the time domain
		self.ifft.process(&mut self.fft_out, &mut self.ifft_out);

		let scale:f64 = 1.0 / (self.len_fft as f64);
		let mut max:f64 = 0.0;
		for (p, c) in self.power[seg].iter_mut().zip(self.ifft_out.iter()) {
			*p = (*c * scale).norm_sqr();
			if *p > max { max = *p; }
		}
		max
	}

}

#[cfg(test)]
mod tests {

	use super::*;
	use crate::settings::Settings;

	fn settings() -> Settings {
		Settings{ intermediate_freq_hz: 0.5e6, sampling_freq_hz: 2.046e6, acq_freq_range_khz: 2.0, ..Settings::default() }
	}

	// Two code periods of the replica, delayed by `delay` samples and modulated onto a carrier
	fn modulated(replica:&Replica, freq:f64, fs:f64, delay:usize, phase:f64) -> Vec<f64> {
		let n = replica.len();
		(0..2*n).map(|idx| {
			let chip = replica.time_domain[(idx + n - delay) % n] as f64;
			chip * (2.0 * consts::PI * freq * (idx as f64) / fs + phase).cos()
		}).collect()
	}

	#[test]
	fn grid_has_one_row_per_bin() {
		let settings = settings();
		let replica = Replica::new(5, &settings).unwrap();
		let signal = modulated(&replica, settings.intermediate_freq_hz, settings.sampling_freq_hz, 0, 0.0);
		let n = settings.samples_per_code();

		let mut correlator = Correlator::new(n, settings.sampling_freq_hz, settings.carrier_wipeoff);
		let ss = correlator.search(&signal[..n], &signal[n..2*n], &replica, &settings.freq_bins_hz()).unwrap();
		assert_eq!(ss.shape(), (17, 2046));
		assert!(ss.rows().flat_map(|r| r.iter()).all(|p| *p >= 0.0));
	}

	#[test]
	fn peak_at_zero_doppler_and_zero_delay() {
		let settings = settings();
		let replica = Replica::new(5, &settings).unwrap();
		let signal = modulated(&replica, settings.intermediate_freq_hz, settings.sampling_freq_hz, 0, 0.3);
		let n = settings.samples_per_code();

		let mut correlator = Correlator::new(n, settings.sampling_freq_hz, CarrierWipeoff::Complex);
		let ss = correlator.search(&signal[..n], &signal[n..2*n], &replica, &settings.freq_bins_hz()).unwrap();
		let (_, freq_bin, code_phase) = ss.global_max();
		assert_eq!(freq_bin, 8);
		assert_eq!(code_phase, 0);
	}

	#[test]
	fn code_phase_follows_delay() {
		let settings = settings();
		let replica = Replica::new(22, &settings).unwrap();
		let signal = modulated(&replica, settings.intermediate_freq_hz - 750.0, settings.sampling_freq_hz, 777, 1.1);
		let n = settings.samples_per_code();

		let mut correlator = Correlator::new(n, settings.sampling_freq_hz, CarrierWipeoff::Complex);
		let ss = correlator.search(&signal[..n], &signal[n..2*n], &replica, &settings.freq_bins_hz()).unwrap();
		let (_, freq_bin, code_phase) = ss.global_max();
		assert_eq!(settings.freq_bin_hz(freq_bin), settings.intermediate_freq_hz - 750.0);
		assert_eq!(code_phase, 777);
	}

	#[test]
	fn complex_wipeoff_ignores_carrier_phase() {
		let settings = settings();
		let replica = Replica::new(7, &settings).unwrap();
		let n = settings.samples_per_code();
		let mut correlator = Correlator::new(n, settings.sampling_freq_hz, CarrierWipeoff::Complex);

		let mut peaks:Vec<f64> = vec![];
		for phase in [0.0, 0.7, 1.6, 3.0].iter() {
			let signal = modulated(&replica, settings.intermediate_freq_hz + 500.0, settings.sampling_freq_hz, 777, *phase);
			let ss = correlator.search(&signal[..n], &signal[n..2*n], &replica, &settings.freq_bins_hz()).unwrap();
			let (peak, freq_bin, code_phase) = ss.global_max();
			assert_eq!(settings.freq_bin_hz(freq_bin), settings.intermediate_freq_hz + 500.0);
			assert_eq!(code_phase, 777);
			peaks.push(peak);
		}

		for p in peaks.iter() { assert!((p - peaks[0]).abs() < 0.05 * peaks[0]); }
	}

	#[test]
	fn in_phase_wipeoff_finds_sine_carrier() {
		// With only the in-phase product the carrier has to line up with the local sine
		let settings = settings();
		let replica = Replica::new(9, &settings).unwrap();
		let signal = modulated(&replica, settings.intermediate_freq_hz, settings.sampling_freq_hz, 100, -consts::FRAC_PI_2);
		let n = settings.samples_per_code();

		let mut correlator = Correlator::new(n, settings.sampling_freq_hz, CarrierWipeoff::InPhase);
		let ss = correlator.search(&signal[..n], &signal[n..2*n], &replica, &settings.freq_bins_hz()).unwrap();
		let (_, freq_bin, code_phase) = ss.global_max();
		assert_eq!(freq_bin, 8);
		assert_eq!(code_phase, 100);
	}

	#[test]
	fn stronger_segment_is_kept() {
		// Flip the sign of the second half of segment one to mimic a bit transition
		let settings = settings();
		let replica = Replica::new(2, &settings).unwrap();
		let n = settings.samples_per_code();
		let mut signal = modulated(&replica, settings.intermediate_freq_hz, settings.sampling_freq_hz, 0, 0.0);
		for s in signal[(n/2)..n].iter_mut() { *s = -*s; }

		let mut correlator = Correlator::new(n, settings.sampling_freq_hz, CarrierWipeoff::Complex);
		let freqs = vec![settings.intermediate_freq_hz];
		let kept = correlator.search(&signal[..n], &signal[n..2*n], &replica, &freqs).unwrap();
		let clean = correlator.search(&signal[n..2*n], &signal[n..2*n], &replica, &freqs).unwrap();
		assert_eq!(kept, clean);
	}

	#[test]
	fn mismatched_lengths_are_rejected() {
		let settings = settings();
		let replica = Replica::new(1, &settings).unwrap();
		let n = settings.samples_per_code();
		let signal = vec![0.0; 2*n];

		let mut correlator = Correlator::new(n, settings.sampling_freq_hz, CarrierWipeoff::Complex);
		let result = correlator.search(&signal[..n-1], &signal[n..2*n], &replica, &settings.freq_bins_hz());
		assert!(matches!(result, Err(AcqErr::ShapeMismatch(_))));

		let mut wrong_len = Correlator::new(n + 1, settings.sampling_freq_hz, CarrierWipeoff::Complex);
		let result = wrong_len.search(&signal[..n+1], &signal[n-1..2*n], &replica, &settings.freq_bins_hz());
		assert!(matches!(result, Err(AcqErr::ShapeMismatch(_))));
	}

}
