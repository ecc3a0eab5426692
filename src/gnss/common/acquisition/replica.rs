
use rustfft::{FFT, FFTplanner};
use num_complex::Complex;
use num_traits::Zero;

use crate::AcqErr;
use crate::gnss::gps_l1_ca::{CODE_LENGTH, signal_modulation};
use crate::settings::Settings;

/// A local code replica at the receiver's sampling rate along with its frequency-domain representation.
/// The transform doesn't depend on the Doppler hypothesis, so it's computed once per satellite.
pub struct Replica {
	pub prn:usize,
	pub time_domain:Vec<i8>,
	/// Conjugate of the forward DFT, ready to be multiplied with the forward DFT of the signal
	pub freq_domain:Vec<Complex<f64>>,
}

impl Replica {

	pub fn new(prn:usize, settings:&Settings) -> Result<Self, AcqErr> {
		let code = signal_modulation::prn_int(prn)?;
		Self::resample(prn, &code, settings.samples_per_code(), settings.sampling_freq_hz, settings.code_freq_basis_hz)
	}

	pub fn resample(prn:usize, code:&[i8], samples_per_code:usize, fs:f64, code_freq_hz:f64) -> Result<Self, AcqErr> {
		if code.len() != CODE_LENGTH { return Err(AcqErr::ShapeMismatch("Code must contain exactly 1023 chips")); }
		if samples_per_code == 0 { return Err(AcqErr::InvalidParameter("Replica must contain at least one sample")); }

		let time_domain:Vec<i8> = (0..samples_per_code)
			.map(|idx| code[signal_modulation::code_sample_index(idx, samples_per_code, fs, code_freq_hz)])
			.collect();

		// Forward FFT
		let mut local_code_time_domain:Vec<Complex<f64>> = time_domain.iter().map(|b| Complex{ re: *b as f64, im: 0.0 }).collect();
		let mut fft_out:Vec<Complex<f64>> = vec![Complex::zero(); samples_per_code];
		let mut planner = FFTplanner::new(false);
		let fft = planner.plan_fft(samples_per_code);
		fft.process(&mut local_code_time_domain, &mut fft_out);

		let freq_domain:Vec<Complex<f64>> = fft_out.into_iter().map(|p| p.conj()).collect();

		Ok(Replica{ prn, time_domain, freq_domain })
	}

	pub fn len(&self) -> usize { self.time_domain.len() }

}
