
use crate::AcqErr;
use crate::settings::Settings;
use super::AcquisitionResult;
use super::search_space::SearchSpace;

/// Turns a search space into an acquisition decision.  The secondary peak is the strongest cell in the
/// primary peak's frequency bin that lies at least one chip away from it (circularly), and the noise floor
/// is the mean over every bin with that same window excluded.
#[derive(Debug, Clone)]
pub struct Detector {
	pub threshold:f64,
	pub samples_per_chip:usize,
	pub fs:f64,
	pub code_freq_hz:f64,
	pub intermediate_freq_hz:f64,
	pub freq_bins_hz:Vec<f64>,
	pub coherent_integration_sec:f64,
}

fn circular_distance(a:usize, b:usize, n:usize) -> usize {
	let d = if a > b { a - b } else { b - a };
	d.min(n - d)
}

impl Detector {

	pub fn new(settings:&Settings) -> Self {
		Detector {
			threshold:                settings.acq_threshold,
			samples_per_chip:         settings.samples_per_chip(),
			fs:                       settings.sampling_freq_hz,
			code_freq_hz:             settings.code_freq_basis_hz,
			intermediate_freq_hz:     settings.intermediate_freq_hz,
			freq_bins_hz:             settings.freq_bins_hz(),
			coherent_integration_sec: settings.code_period_sec(),
		}
	}

	pub fn detect(&self, prn:usize, search_space:&SearchSpace) -> Result<AcquisitionResult, AcqErr> {
		if search_space.n_freq_bins() != self.freq_bins_hz.len() {
			return Err(AcqErr::ShapeMismatch("Search space doesn't have one row per frequency bin"));
		}
		if search_space.rows().flat_map(|row| row.iter()).any(|p| p.is_nan()) {
			return Err(AcqErr::InvalidParameter("Search space contains NaN power"));
		}

		let n:usize = search_space.samples_per_code();
		let (peak_power, freq_bin, code_phase) = search_space.global_max();
		let in_guard = |idx:usize| circular_distance(idx, code_phase, n) < self.samples_per_chip;

		let second_peak_power:f64 = search_space.row(freq_bin).iter().enumerate()
			.filter(|(idx, _)| !in_guard(*idx))
			.fold(0.0, |acc, (_, p)| if *p > acc { *p } else { acc });

		let (noise_sum, noise_count) = search_space.rows()
			.flat_map(|row| row.iter().enumerate())
			.filter(|(idx, _)| !in_guard(*idx))
			.fold((0.0, 0usize), |(sum, count), (_, p)| (sum + p, count + 1));
		let noise_floor:f64 = if noise_count > 0 { noise_sum / (noise_count as f64) } else { 0.0 };

		let peak_metric:f64 = if peak_power <= 0.0 { 0.0 }
			else if second_peak_power <= 0.0 { std::f64::INFINITY }
			else { peak_power / second_peak_power };

		let snr_db_hz:f64 = if peak_power <= 0.0 { std::f64::NEG_INFINITY }
			else if noise_floor <= 0.0 { std::f64::INFINITY }
			else { 10.0 * (peak_power / noise_floor).log10() - 10.0 * self.coherent_integration_sec.log10() };

		let carrier_freq_hz:f64 = self.freq_bins_hz[freq_bin];

		Ok(AcquisitionResult {
			prn, carrier_freq_hz, freq_bin, code_phase,
			doppler_hz:       carrier_freq_hz - self.intermediate_freq_hz,
			code_delay_chips: (code_phase as f64) * self.code_freq_hz / self.fs,
			code_delay_sec:   (code_phase as f64) / self.fs,
			peak_power, second_peak_power, peak_metric, snr_db_hz,
			detected:         peak_metric >= self.threshold,
		})
	}

}

#[cfg(test)]
mod tests {

	use super::*;

	fn detector(freq_bins_hz:Vec<f64>, samples_per_chip:usize) -> Detector {
		Detector{ threshold: 2.5, samples_per_chip, fs: 2.046e6, code_freq_hz: 1.023e6, intermediate_freq_hz: 1000.0,
			freq_bins_hz, coherent_integration_sec: 1.0e-3 }
	}

	#[test]
	fn metric_ignores_cells_inside_guard() {
		let mut ss = SearchSpace::new(2, 20).unwrap();
		let mut row = vec![1.0; 20];
		row[10] = 100.0;
		row[11] = 90.0;
		row[12] = 80.0;
		row[15] = 20.0;
		ss.set_row(1, &row).unwrap();

		let result = detector(vec![875.0, 1000.0], 3).detect(4, &ss).unwrap();
		assert_eq!(result.prn, 4);
		assert_eq!(result.freq_bin, 1);
		assert_eq!(result.code_phase, 10);
		assert_eq!(result.second_peak_power, 20.0);
		assert_eq!(result.peak_metric, 5.0);
		assert!(result.detected);
	}

	#[test]
	fn guard_wraps_around_the_code_period() {
		let mut ss = SearchSpace::new(1, 20).unwrap();
		let mut row = vec![1.0; 20];
		row[0] = 100.0;
		row[19] = 99.0;
		row[18] = 98.0;
		row[5] = 50.0;
		ss.set_row(0, &row).unwrap();

		let result = detector(vec![1000.0], 3).detect(1, &ss).unwrap();
		assert_eq!(result.code_phase, 0);
		assert_eq!(result.second_peak_power, 50.0);
		assert_eq!(result.peak_metric, 2.0);
		assert!(!result.detected);
	}

	#[test]
	fn window_edges_remain_eligible() {
		let mut ss = SearchSpace::new(1, 20).unwrap();
		let mut row = vec![0.0; 20];
		row[10] = 100.0;
		row[12] = 40.0;
		ss.set_row(0, &row).unwrap();

		assert_eq!(detector(vec![1000.0], 2).detect(1, &ss).unwrap().second_peak_power, 40.0);
		assert_eq!(detector(vec![1000.0], 3).detect(1, &ss).unwrap().peak_metric, std::f64::INFINITY);
	}

	#[test]
	fn no_competing_energy_is_infinite_metric() {
		let mut ss = SearchSpace::new(3, 10).unwrap();
		let mut row = vec![0.0; 10];
		row[4] = 7.0;
		ss.set_row(2, &row).unwrap();

		let result = detector(vec![750.0, 875.0, 1000.0], 1).detect(1, &ss).unwrap();
		assert_eq!(result.peak_metric, std::f64::INFINITY);
		assert_eq!(result.snr_db_hz, std::f64::INFINITY);
		assert!(result.detected);
	}

	#[test]
	fn empty_grid_is_not_detected() {
		let ss = SearchSpace::new(3, 10).unwrap();
		let result = detector(vec![750.0, 875.0, 1000.0], 1).detect(1, &ss).unwrap();
		assert_eq!(result.peak_metric, 0.0);
		assert_eq!(result.snr_db_hz, std::f64::NEG_INFINITY);
		assert!(!result.detected);
	}

	#[test]
	fn snr_against_flat_noise_floor() {
		let mut ss = SearchSpace::new(1, 10).unwrap();
		let mut row = vec![1.0; 10];
		row[3] = 100.0;
		ss.set_row(0, &row).unwrap();

		// 20 dB over the floor plus 30 dB for the 1 ms integration
		let result = detector(vec![1000.0], 1).detect(1, &ss).unwrap();
		assert!((result.snr_db_hz - 50.0).abs() < 1.0e-9);
	}

	#[test]
	fn physical_units() {
		let mut ss = SearchSpace::new(2, 2046).unwrap();
		let mut row = vec![0.5; 2046];
		row[1000] = 10.0;
		ss.set_row(0, &row).unwrap();

		let result = detector(vec![875.0, 1000.0], 2).detect(1, &ss).unwrap();
		assert_eq!(result.carrier_freq_hz, 875.0);
		assert_eq!(result.doppler_hz, -125.0);
		assert_eq!(result.code_phase, 1000);
		assert!((result.code_delay_chips - 500.0).abs() < 1.0e-9);
		assert!((result.code_delay_sec - 1000.0 / 2.046e6).abs() < 1.0e-15);
	}

	#[test]
	fn nan_cells_are_never_a_detection() {
		let mut ss = SearchSpace::new(2, 10).unwrap();
		ss.set_row(0, &[std::f64::NAN; 10]).unwrap();
		ss.set_row(1, &[std::f64::NAN; 10]).unwrap();
		assert_eq!(detector(vec![875.0, 1000.0], 1).detect(1, &ss).err(), Some(AcqErr::InvalidParameter("Search space contains NaN power")));

		let mut row = vec![1.0; 10];
		row[6] = std::f64::NAN;
		let mut ss = SearchSpace::new(1, 10).unwrap();
		ss.set_row(0, &row).unwrap();
		assert!(detector(vec![1000.0], 1).detect(1, &ss).is_err());
	}

	#[test]
	fn wrong_bin_count_fails() {
		let ss = SearchSpace::new(4, 10).unwrap();
		assert!(matches!(detector(vec![1000.0], 1).detect(1, &ss), Err(AcqErr::ShapeMismatch(_))));
	}

}
