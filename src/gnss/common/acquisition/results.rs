
use serde::{Serialize, Deserialize};

use crate::AcqErr;
use super::AcquisitionResult;
use super::search_space::SearchSpace;

/// What happened to one satellite of the mask
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Outcome {
	Acquired(AcquisitionResult),
	Failed(String),
}

/// Per-PRN storage for a whole acquisition run.  Every array is indexed directly by PRN, so index zero is
/// reserved and always empty.
#[derive(Debug, Clone, Default)]
pub struct AcqResults {
	outcomes:Vec<Option<Outcome>>,
	search_space:Vec<Option<SearchSpace>>,
}

impl AcqResults {

	pub fn initialize(len:usize) -> Self {
		Self{ outcomes: vec![None; len], search_space: vec![None; len] }
	}

	/// Sized so that every PRN of the mask indexes directly, whatever the mask's length
	pub fn for_mask(sat_mask:&[usize]) -> Self {
		let max_prn:usize = sat_mask.iter().cloned().max().unwrap_or(0);
		Self::initialize(1 + sat_mask.len().max(max_prn))
	}

	pub fn len(&self) -> usize { self.outcomes.len() }

	fn check_index(&self, prn:usize) -> Result<(), AcqErr> {
		if prn == 0 || prn >= self.outcomes.len() { Err(AcqErr::InvalidParameter("PRN is outside of the results arrays")) }
		else { Ok(()) }
	}

	pub fn record(&mut self, prn:usize, result:AcquisitionResult) -> Result<(), AcqErr> {
		self.check_index(prn)?;
		self.outcomes[prn] = Some(Outcome::Acquired(result));
		Ok(())
	}

	pub fn record_search_space(&mut self, prn:usize, search_space:SearchSpace) -> Result<(), AcqErr> {
		self.check_index(prn)?;
		self.search_space[prn] = Some(search_space);
		Ok(())
	}

	pub fn record_failure(&mut self, prn:usize, err:AcqErr) -> Result<(), AcqErr> {
		self.check_index(prn)?;
		self.outcomes[prn] = Some(Outcome::Failed(format!("{}", err)));
		Ok(())
	}

	pub fn outcome(&self, prn:usize) -> Option<&Outcome> { self.outcomes.get(prn).and_then(|o| o.as_ref()) }

	pub fn result(&self, prn:usize) -> Option<&AcquisitionResult> {
		match self.outcome(prn) {
			Some(Outcome::Acquired(r)) => Some(r),
			_ => None
		}
	}

	pub fn search_space(&self, prn:usize) -> Option<&SearchSpace> { self.search_space.get(prn).and_then(|s| s.as_ref()) }

	// Read-only getter methods
	pub fn carr_freq(&self, prn:usize)   -> Option<f64> { self.result(prn).map(|r| r.carrier_freq_hz) }
	pub fn code_delay(&self, prn:usize)  -> Option<f64> { self.result(prn).map(|r| r.code_delay_chips) }
	pub fn code_phase(&self, prn:usize)  -> Option<usize> { self.result(prn).map(|r| r.code_phase) }
	pub fn peak_metric(&self, prn:usize) -> Option<f64> { self.result(prn).map(|r| r.peak_metric) }
	pub fn snr(&self, prn:usize)         -> Option<f64> { self.result(prn).map(|r| r.snr_db_hz) }
	pub fn detected(&self, prn:usize)    -> bool { self.result(prn).map(|r| r.detected).unwrap_or(false) }

	/// Peak metric for every index, zero where nothing was recorded; suitable for a bar chart by PRN
	pub fn peak_metrics(&self) -> Vec<f64> { (0..self.len()).map(|prn| self.peak_metric(prn).unwrap_or(0.0)).collect() }

	pub fn snrs(&self) -> Vec<f64> { (0..self.len()).map(|prn| self.snr(prn).unwrap_or(0.0)).collect() }

	pub fn acquired(&self) -> Vec<&AcquisitionResult> {
		self.outcomes.iter().filter_map(|o| match o {
			Some(Outcome::Acquired(r)) if r.detected => Some(r),
			_ => None
		}).collect()
	}

	pub fn failures(&self) -> Vec<(usize, &str)> {
		self.outcomes.iter().enumerate().filter_map(|(prn, o)| match o {
			Some(Outcome::Failed(e)) => Some((prn, e.as_str())),
			_ => None
		}).collect()
	}

	/// Detected PRNs ordered by decreasing peak metric, at most one per receiver channel
	pub fn strongest(&self, number_of_channels:usize) -> Vec<usize> {
		let mut acquired = self.acquired();
		acquired.sort_by(|a, b| b.peak_metric.partial_cmp(&a.peak_metric).unwrap_or(std::cmp::Ordering::Equal)
			.then(a.prn.cmp(&b.prn)));
		acquired.into_iter().take(number_of_channels).map(|r| r.prn).collect()
	}

}
