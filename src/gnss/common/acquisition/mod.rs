
use serde::{Serialize, Deserialize};

pub mod batch;
pub mod detector;
pub mod replica;
pub mod results;
pub mod search_space;
pub mod two_segment_pcps;


#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AcquisitionResult {
	pub prn:usize,
	/// Absolute carrier frequency of the winning bin, IF included
	pub carrier_freq_hz:f64,
	pub doppler_hz:f64,
	pub freq_bin:usize,
	/// Code phase in samples; this is also the sample delay of the code within the input
	pub code_phase:usize,
	pub code_delay_chips:f64,
	pub code_delay_sec:f64,
	pub peak_power:f64,
	pub second_peak_power:f64,
	/// Ratio of the primary to the secondary peak; infinite if there's no competing energy at all
	pub peak_metric:f64,
	pub snr_db_hz:f64,
	pub detected:bool,
}
