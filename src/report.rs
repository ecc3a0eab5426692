
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::PathBuf;

use serde::Serialize;

use crate::AcqErr;
use crate::gnss::common::acquisition::AcquisitionResult;
use crate::gnss::common::acquisition::results::AcqResults;
use crate::gnss::common::acquisition::search_space::SearchSpace;
use crate::settings::Settings;

/// Presents the results of an acquisition run somewhere outside the process
pub trait Render {
	fn render(&mut self, results:&AcqResults, settings:&Settings) -> Result<(), AcqErr>;
}

#[derive(Debug, Serialize)]
pub struct FailureRecord {
	pub prn:usize,
	pub error:String,
}

/// Everything a downstream tracking stage or a plotting script needs from one run
#[derive(Debug, Serialize)]
pub struct Summary<'a> {
	pub intermediate_freq_hz:f64,
	pub sampling_freq_hz:f64,
	pub acq_threshold:f64,
	pub sat_mask:&'a [usize],
	pub peak_metrics:Vec<f64>,
	pub results:Vec<&'a AcquisitionResult>,
	pub failures:Vec<FailureRecord>,
	pub channels:Vec<usize>,
}

impl<'a> Summary<'a> {

	pub fn new(results:&'a AcqResults, settings:&'a Settings) -> Self {
		Summary {
			intermediate_freq_hz: settings.intermediate_freq_hz,
			sampling_freq_hz:     settings.sampling_freq_hz,
			acq_threshold:        settings.acq_threshold,
			sat_mask:             &settings.sat_mask,
			peak_metrics:         results.peak_metrics(),
			results:              settings.sat_mask.iter().filter_map(|prn| results.result(*prn)).collect(),
			failures:             results.failures().into_iter().map(|(prn, e)| FailureRecord{ prn, error: e.to_string() }).collect(),
			channels:             results.strongest(settings.number_of_channels),
		}
	}

}

/// Writes `acquisition.json` into the output directory along with one CSV per retained search space
pub struct JsonReport {
	pub output_dir:PathBuf,
}

impl JsonReport {

	pub fn new(settings:&Settings) -> Self { JsonReport{ output_dir: PathBuf::from(&settings.output_dir) } }

	pub fn search_space_file(&self, prn:usize) -> PathBuf { self.output_dir.join(format!("search_space_prn{:02}.csv", prn)) }

	fn write_search_space(&self, prn:usize, search_space:&SearchSpace) -> Result<(), AcqErr> {
		let f = File::create(self.search_space_file(prn)).map_err(|_| AcqErr::Io("Unable to create search space file"))?;
		let mut w = BufWriter::new(f);
		for row in search_space.rows() {
			let line:Vec<String> = row.iter().map(|p| format!("{:e}", p)).collect();
			writeln!(w, "{}", line.join(",")).map_err(|_| AcqErr::Io("Unable to write search space file"))?;
		}
		w.flush().map_err(|_| AcqErr::Io("Unable to write search space file"))
	}

}

impl Render for JsonReport {

	fn render(&mut self, results:&AcqResults, settings:&Settings) -> Result<(), AcqErr> {
		fs::create_dir_all(&self.output_dir).map_err(|_| AcqErr::Io("Unable to create output directory"))?;

		let summary = Summary::new(results, settings);
		let json = serde_json::to_string_pretty(&summary).map_err(|_| AcqErr::Io("Unable to serialize results"))?;
		fs::write(self.output_dir.join("acquisition.json"), json).map_err(|_| AcqErr::Io("Unable to write results file"))?;

		for prn in settings.sat_mask.iter() {
			if let Some(search_space) = results.search_space(*prn) {
				self.write_search_space(*prn, search_space)?;
			}
		}

		Ok(())
	}

}
