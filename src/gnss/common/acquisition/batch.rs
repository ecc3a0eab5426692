
use std::sync::Arc;

use colored::*;
use tokio::sync::Semaphore;
use tokio::task;

use crate::AcqErr;
use crate::gnss::gps_l1_ca;
use crate::settings::Settings;
use super::AcquisitionResult;
use super::detector::Detector;
use super::replica::Replica;
use super::results::AcqResults;
use super::search_space::SearchSpace;
use super::two_segment_pcps::Correlator;

/// The two consecutive code periods at the start of the buffer that every satellite search works on.
/// A single NaN or infinite sample would spread through every cell of the search space, so those are rejected.
pub fn signal_segments<'a>(settings:&Settings, signal:&'a [f64]) -> Result<(&'a [f64], &'a [f64]), AcqErr> {
	let n:usize = settings.samples_per_code();
	if signal.len() < 2*n { return Err(AcqErr::InsufficientInput{ needed: 2*n, available: signal.len() }); }
	if !signal[..2*n].iter().all(|s| s.is_finite()) {
		return Err(AcqErr::InvalidParameter("Input samples must be finite"));
	}
	Ok((&signal[..n], &signal[n..2*n]))
}

/// Search space for one satellite: code generation, replica sampling and the correlation search
pub fn search_prn(settings:&Settings, signal:&[f64], prn:usize) -> Result<SearchSpace, AcqErr> {
	gps_l1_ca::check_prn(prn)?;
	let (signal1, signal2) = signal_segments(settings, signal)?;

	let replica = Replica::new(prn, settings)?;
	let mut correlator = Correlator::new(settings.samples_per_code(), settings.sampling_freq_hz, settings.carrier_wipeoff);
	correlator.search(signal1, signal2, &replica, &settings.freq_bins_hz())
}

pub fn acquire_prn(settings:&Settings, signal:&[f64], prn:usize) -> Result<(AcquisitionResult, SearchSpace), AcqErr> {
	let search_space = search_prn(settings, signal, prn)?;
	let result = Detector::new(settings).detect(prn, &search_space)?;
	Ok((result, search_space))
}

fn check_run(settings:&Settings, signal:&[f64]) -> Result<(), AcqErr> {
	settings.validate()?;
	signal_segments(settings, signal)?;
	Ok(())
}

/// Acquire every satellite in the mask, one after another.  Any failure ends the run.
pub fn acquire(settings:&Settings, signal:&[f64]) -> Result<AcqResults, AcqErr> {
	check_run(settings, signal)?;

	let mut results = AcqResults::for_mask(&settings.sat_mask);
	for prn in settings.sat_mask.iter() {
		let (result, search_space) = acquire_prn(settings, signal, *prn)?;
		results.record(*prn, result)?;
		if settings.keep_search_space { results.record_search_space(*prn, search_space)?; }
	}

	Ok(results)
}

/// Acquire every satellite in the mask on the blocking thread pool, at most one search per core at a time.
/// A satellite whose search fails is recorded as a failure without affecting the others.
pub async fn acquire_concurrent(settings:Arc<Settings>, signal:Arc<Vec<f64>>) -> Result<AcqResults, AcqErr> {
	check_run(&settings, &signal)?;

	let sat_mask = settings.sat_mask.clone();
	let keep_search_space = settings.keep_search_space;
	let search = Arc::new(move |prn:usize| acquire_prn(&settings, &signal, prn));

	run_concurrent(&sat_mask, keep_search_space, search).await
}

async fn run_concurrent<F>(sat_mask:&[usize], keep_search_space:bool, search:Arc<F>) -> Result<AcqResults, AcqErr>
	where F: Fn(usize) -> Result<(AcquisitionResult, SearchSpace), AcqErr> + Send + Sync + 'static {

	let n_workers:usize = std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1);
	let permits = Arc::new(Semaphore::new(n_workers));

	let handles:Vec<_> = sat_mask.iter().map(|prn| {
		let prn = *prn;
		let (search, permits) = (search.clone(), permits.clone());
		let handle = tokio::spawn(async move {
			let _permit = permits.acquire().await;
			match task::spawn_blocking(move || (*search)(prn)).await {
				Ok(outcome) => outcome,
				Err(_)      => Err(AcqErr::TaskFailed("Satellite search did not run to completion")),
			}
		});
		(prn, handle)
	}).collect();

	let mut results = AcqResults::for_mask(sat_mask);
	for (prn, handle) in handles {
		let outcome = match handle.await {
			Ok(outcome) => outcome,
			Err(_)      => Err(AcqErr::TaskFailed("Satellite task was cancelled")),
		};

		match outcome {
			Ok((result, search_space)) => {
				results.record(prn, result)?;
				if keep_search_space { results.record_search_space(prn, search_space)?; }
			},
			Err(e) => {
				eprintln!("{}", format!("PRN {:02}: Error due to {}", prn, e).red());
				results.record_failure(prn, e)?;
			}
		}
	}

	Ok(results)
}
