
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use byteorder::{ByteOrder, LittleEndian, ReadBytesExt, WriteBytesExt};
use colored::*;

use crate::AcqErr;
use crate::settings::{SampleFormat, Settings};

/// Leading bytes of every cache file
pub const CACHE_MAGIC:[u8; 8] = *b"GPSACQ1\0";

pub fn read_i8_samples<R: Read>(src:R, max_samples:usize) -> Result<Vec<f64>, AcqErr> {
	let mut buffer:Vec<u8> = vec![];
	src.take(max_samples as u64).read_to_end(&mut buffer).map_err(|_| AcqErr::Io("Unable to read from file"))?;
	Ok(buffer.into_iter().map(|b| (b as i8) as f64).collect())
}

/// Little-endian i16 samples; a trailing odd byte is ignored
pub fn read_i16_samples<R: Read>(src:R, max_samples:usize) -> Result<Vec<f64>, AcqErr> {
	let mut buffer:Vec<u8> = vec![];
	src.take(2 * max_samples as u64).read_to_end(&mut buffer).map_err(|_| AcqErr::Io("Unable to read from file"))?;
	Ok(buffer.chunks_exact(2).map(|b| LittleEndian::read_i16(b) as f64).collect())
}

/// Whitespace-separated decimal samples; NaN and infinite values are rejected
pub fn read_text_samples<R: Read>(mut src:R, max_samples:usize) -> Result<Vec<f64>, AcqErr> {
	let mut text = String::new();
	src.read_to_string(&mut text).map_err(|_| AcqErr::Io("Unable to read text samples"))?;
	text.split_whitespace().take(max_samples)
		.map(|s| match s.parse::<f64>() {
			Ok(x) if x.is_finite() => Ok(x),
			Ok(_)  => Err(AcqErr::Io("Text sample is not a finite number")),
			Err(_) => Err(AcqErr::Io("Unable to parse text sample")),
		})
		.collect()
}

/// Real-valued samples from a file, at most `max_samples` of them
pub fn load_samples(path:&str, format:SampleFormat, max_samples:usize) -> Result<Vec<f64>, AcqErr> {
	let f = File::open(path).map_err(|_| AcqErr::Io("Unable to open input file"))?;
	let src = BufReader::new(f);
	match format {
		SampleFormat::I8   => read_i8_samples(src, max_samples),
		SampleFormat::I16  => read_i16_samples(src, max_samples),
		SampleFormat::Text => read_text_samples(src, max_samples),
	}
}

pub fn load(settings:&Settings) -> Result<Vec<f64>, AcqErr> {
	load_samples(&settings.input_file, settings.data_format, settings.samples_to_process())
}

pub fn write_cache<W: Write>(mut dest:W, samples:&[f64]) -> Result<(), AcqErr> {
	dest.write_all(&CACHE_MAGIC).map_err(|_| AcqErr::Io("Unable to write cache header"))?;
	dest.write_u64::<LittleEndian>(samples.len() as u64).map_err(|_| AcqErr::Io("Unable to write cache header"))?;
	for s in samples {
		dest.write_f64::<LittleEndian>(*s).map_err(|_| AcqErr::Io("Unable to write cache samples"))?;
	}
	dest.flush().map_err(|_| AcqErr::Io("Unable to write cache samples"))
}

pub fn read_cache<R: Read>(mut src:R) -> Result<Vec<f64>, AcqErr> {
	let mut magic = [0u8; 8];
	src.read_exact(&mut magic).map_err(|_| AcqErr::Io("Cache file is too short"))?;
	if magic != CACHE_MAGIC { return Err(AcqErr::Io("Not a sample cache file")); }

	let count = src.read_u64::<LittleEndian>().map_err(|_| AcqErr::Io("Cache file is too short"))? as usize;
	let mut samples:Vec<f64> = Vec::with_capacity(count.min(1 << 24));
	for _ in 0..count {
		samples.push(src.read_f64::<LittleEndian>().map_err(|_| AcqErr::Io("Cache file is truncated"))?);
	}
	Ok(samples)
}

pub fn save_cache(path:&str, samples:&[f64]) -> Result<(), AcqErr> {
	let f = File::create(path).map_err(|_| AcqErr::Io("Unable to create cache file"))?;
	write_cache(BufWriter::new(f), samples)
}

pub fn load_cache(path:&str) -> Result<Vec<f64>, AcqErr> {
	let f = File::open(path).map_err(|_| AcqErr::Io("Unable to open cache file"))?;
	read_cache(BufReader::new(f))
}

/// Reuse the cached copy of the input if there is one, otherwise load the input and cache it.
/// Failing to write the cache isn't fatal, only reported.
pub fn load_or_cache(settings:&Settings) -> Result<Vec<f64>, AcqErr> {
	let cache_file = settings.cache_file();
	if Path::new(&cache_file).exists() {
		if let Ok(samples) = load_cache(&cache_file) { return Ok(samples); }
	}

	let samples = load(settings)?;
	if let Err(e) = save_cache(&cache_file, &samples) {
		eprintln!("{}", format!("Unable to cache samples at {}: {}", cache_file, e).yellow());
	}
	Ok(samples)
}
