
use std::fs::File;
use std::io::BufReader;

use serde::{Serialize, Deserialize};

use crate::AcqErr;
use crate::gnss::gps_l1_ca;

/// Spacing between adjacent Doppler hypotheses
pub const FREQ_BIN_STEP_HZ:f64 = 125.0;

/// Bins per kHz of search range, i.e. 1000 / FREQ_BIN_STEP_HZ
pub const FREQ_BINS_PER_KHZ:f64 = 8.0;

#[derive(Debug, PartialEq, Eq, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SampleFormat {
	I8,
	I16,
	Text,
}

impl SampleFormat {

	pub fn name(&self) -> &'static str {
		match self {
			SampleFormat::I8   => "i8",
			SampleFormat::I16  => "i16",
			SampleFormat::Text => "text",
		}
	}

}

/// Which demodulated components are fed into the forward transform of each segment
#[derive(Debug, PartialEq, Eq, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CarrierWipeoff {
	/// Only the in-phase product (sine replica times signal).  Both the correlation power and the winning
	/// frequency bin depend on the unknown carrier phase, so the Doppler estimate can land bins away from
	/// the true one.
	InPhase,
	/// I + jQ, which keeps the correlation power independent of carrier phase
	Complex,
}

/// Receiver configuration.  Passed by reference into every entry point and never mutated by the core.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
	pub input_file:String,
	pub signal:String,
	pub data_format:SampleFormat,
	pub intermediate_freq_hz:f64,
	pub sampling_freq_hz:f64,
	pub code_freq_basis_hz:f64,
	pub code_length:usize,
	pub sat_mask:Vec<usize>,
	pub acq_freq_range_khz:f64,
	pub acq_threshold:f64,
	pub number_of_channels:usize,
	pub ms_to_process:usize,
	pub output_dir:String,
	pub carrier_wipeoff:CarrierWipeoff,
	pub keep_search_space:bool,
}

impl Default for Settings {

	fn default() -> Self {
		Settings {
			input_file:           "../DATA/GPS_RECORDED_RAW_SIGNAL_37000ms.dat".to_string(),
			signal:               "gpsl1c".to_string(),
			data_format:          SampleFormat::I8,
			intermediate_freq_hz: 9.548e6,
			sampling_freq_hz:     38.192e6,
			code_freq_basis_hz:   gps_l1_ca::CODE_FREQ_BASIS_HZ,
			code_length:          gps_l1_ca::CODE_LENGTH,
			sat_mask:             (1..=gps_l1_ca::MAX_PRN).collect(),
			acq_freq_range_khz:   14.0,
			acq_threshold:        2.5,
			number_of_channels:   10,
			ms_to_process:        3000,
			output_dir:           "SW-RCVR".to_string(),
			carrier_wipeoff:      CarrierWipeoff::Complex,
			keep_search_space:    false,
		}
	}

}

impl Settings {

	pub fn from_json_file(path:&str) -> Result<Self, AcqErr> {
		let f = File::open(path).map_err(|_| AcqErr::Io("Unable to open settings file"))?;
		serde_json::from_reader(BufReader::new(f)).map_err(|_| AcqErr::Io("Unable to parse settings file"))
	}

	pub fn samples_per_code(&self) -> usize {
		((self.sampling_freq_hz * (self.code_length as f64)) / self.code_freq_basis_hz).round() as usize
	}

	pub fn samples_per_chip(&self) -> usize {
		(self.sampling_freq_hz / self.code_freq_basis_hz).round() as usize
	}

	pub fn n_freq_bins(&self) -> usize {
		(self.acq_freq_range_khz * FREQ_BINS_PER_KHZ).round() as usize + 1
	}

	/// Absolute carrier frequency of bin `k`, IF included
	pub fn freq_bin_hz(&self, k:usize) -> f64 {
		self.intermediate_freq_hz - (self.acq_freq_range_khz * 500.0) + (FREQ_BIN_STEP_HZ * (k as f64))
	}

	pub fn freq_bins_hz(&self) -> Vec<f64> { (0..self.n_freq_bins()).map(|k| self.freq_bin_hz(k)).collect() }

	pub fn code_period_sec(&self) -> f64 { (self.code_length as f64) / self.code_freq_basis_hz }

	pub fn samples_to_process(&self) -> usize {
		((self.ms_to_process as f64) * 1.0e-3 * self.sampling_freq_hz).round() as usize
	}

	/// Where a memoized copy of the input signal lives.  The sample format and rate are part of the name
	/// along with the duration.
	pub fn cache_file(&self) -> String {
		format!("{}.{}ms.{}.{:.0}sps.bin", self.input_file, self.ms_to_process, self.data_format.name(), self.sampling_freq_hz)
	}

	pub fn validate(&self) -> Result<(), AcqErr> {
		if !self.signal.contains("gpsl1c") {
			return Err(AcqErr::InvalidParameter("Unsupported signal type; only gpsl1c is available"));
		}
		if !(self.sampling_freq_hz > 0.0) || !self.sampling_freq_hz.is_finite() {
			return Err(AcqErr::InvalidParameter("Sampling frequency must be positive"));
		}
		if !(self.code_freq_basis_hz > 0.0) || !self.code_freq_basis_hz.is_finite() {
			return Err(AcqErr::InvalidParameter("Code chip rate must be positive"));
		}
		if !self.intermediate_freq_hz.is_finite() {
			return Err(AcqErr::InvalidParameter("Intermediate frequency must be finite"));
		}
		if self.code_length != gps_l1_ca::CODE_LENGTH {
			return Err(AcqErr::InvalidParameter("Code length must be 1023 chips for GPS L1 C/A"));
		}
		// A negative range would round to a non-positive number of bins
		if !(self.acq_freq_range_khz >= 0.0) || !self.acq_freq_range_khz.is_finite() {
			return Err(AcqErr::InvalidParameter("Frequency search range must produce at least one bin"));
		}
		if self.samples_per_code() == 0 || self.samples_per_chip() == 0 {
			return Err(AcqErr::InvalidParameter("Sampling frequency too low for the code rate"));
		}
		if self.acq_threshold.is_nan() {
			return Err(AcqErr::InvalidParameter("Acquisition threshold must be a number"));
		}
		for prn in self.sat_mask.iter() {
			gps_l1_ca::check_prn(*prn)?;
		}
		Ok(())
	}

}
