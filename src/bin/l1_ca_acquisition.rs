
extern crate clap;
extern crate colored;
extern crate gps_acquisition;
extern crate serde_json;
extern crate tokio;

use std::sync::Arc;

use clap::{Arg, App};
use colored::*;
use gps_acquisition::{AcqErr, AcqResults, Settings};
use gps_acquisition::batch;
use gps_acquisition::io;
use gps_acquisition::report::{JsonReport, Render, Summary};
use gps_acquisition::settings::SampleFormat;

fn settings_from_args() -> Result<(Settings, bool), AcqErr> {

	let matches = App::new("GPS L1 CA Acquisition")
		.version("0.1.0")
		.about("Searches a block of real-valued IF samples for GPS L1 C/A satellites and reports Doppler, code phase, and detection metric for each")
		.arg(Arg::with_name("settings")
			.short("c").long("settings")
			.help("JSON settings file; fields not given take their default values")
			.takes_value(true))
		.arg(Arg::with_name("filename")
			.short("f").long("filename")
			.help("Input filename")
			.takes_value(true))
		.arg(Arg::with_name("input_type")
			.short("t").long("type")
			.takes_value(true)
			.possible_values(&["i8", "i16", "text"]))
		.arg(Arg::with_name("output_dir")
			.short("o").long("output_dir")
			.takes_value(true))
		.arg(Arg::with_name("concurrent")
			.long("concurrent")
			.help("Search satellites in parallel"))
		.arg(Arg::with_name("keep_search_space")
			.long("keep_search_space")
			.help("Write the full search space of every satellite to the output directory"))
		.get_matches();

	let mut settings = match matches.value_of("settings") {
		Some(path) => Settings::from_json_file(path)?,
		None => Settings::default(),
	};

	if let Some(fname) = matches.value_of("filename") { settings.input_file = fname.to_string(); }
	if let Some(dir) = matches.value_of("output_dir") { settings.output_dir = dir.to_string(); }
	match matches.value_of("input_type") {
		Some("i8")   => settings.data_format = SampleFormat::I8,
		Some("i16")  => settings.data_format = SampleFormat::I16,
		Some("text") => settings.data_format = SampleFormat::Text,
		_ => {},
	}
	if matches.is_present("keep_search_space") { settings.keep_search_space = true; }

	settings.validate()?;
	Ok((settings, matches.is_present("concurrent")))
}

async fn run(settings:Settings, concurrent:bool) -> Result<AcqResults, AcqErr> {
	let signal:Vec<f64> = io::load_or_cache(&settings)?;
	eprintln!("Loaded {} samples from {} ({} expected)", signal.len(), &settings.input_file, settings.samples_to_process());

	let results = if concurrent {
		batch::acquire_concurrent(Arc::new(settings.clone()), Arc::new(signal)).await?
	} else {
		batch::acquire(&settings, &signal)?
	};

	for prn in settings.sat_mask.iter() {
		if let Some(result) = results.result(*prn) {
			let result_str = format!("{:9.2} [Hz], {:6} [samples], {:8.2} [chips], metric {:7.3}, {:6.2} [dB-Hz]",
				result.doppler_hz, result.code_phase, result.code_delay_chips, result.peak_metric, result.snr_db_hz);
			if result.detected { eprintln!("PRN {:02} {}", prn, result_str.green()); }
			else               { eprintln!("PRN {:02} {}", prn, result_str.yellow()); }
		}
	}

	let mut report = JsonReport::new(&settings);
	report.render(&results, &settings)?;

	// Output data in JSON format
	let summary = Summary::new(&results, &settings);
	let json = serde_json::to_string_pretty(&summary).map_err(|_| AcqErr::Io("Unable to serialize results"))?;
	println!("{}", json);

	Ok(results)
}

#[tokio::main]
async fn main() {

	let (settings, concurrent) = match settings_from_args() {
		Ok(args) => args,
		Err(e) => {
			eprintln!("{}", format!("Error due to {}", e).red());
			std::process::exit(1);
		}
	};

	eprintln!("Acquiring {} satellites from {} at {} [samples/sec]", settings.sat_mask.len(), &settings.input_file, settings.sampling_freq_hz);

	match run(settings.clone(), concurrent).await {
		Ok(results) => {
			let channels = results.strongest(settings.number_of_channels);
			eprintln!("{}", format!("Acquired {} satellites, channels assigned to PRNs {:?}", results.acquired().len(), channels).green());
		},
		Err(e) => {
			eprintln!("{}", format!("Error due to {}", e).red());
			std::process::exit(1);
		}
	}

}
