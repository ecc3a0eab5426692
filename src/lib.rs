
use std::fmt;

pub mod gnss;
pub mod io;
pub mod report;
pub mod settings;

pub use gnss::common::acquisition::{AcquisitionResult, batch, detector, replica, results::AcqResults, search_space::SearchSpace};
pub use settings::Settings;

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum AcqErr {
	InvalidParameter(&'static str),
	InsufficientInput{ needed:usize, available:usize },
	ShapeMismatch(&'static str),
	TaskFailed(&'static str),
	Io(&'static str),
}

impl fmt::Display for AcqErr {
	fn fmt(&self, f:&mut fmt::Formatter) -> fmt::Result {
		match self {
			AcqErr::InvalidParameter(s)                     => write!(f, "Invalid parameter: {}", s),
			AcqErr::InsufficientInput{ needed, available }  => write!(f, "Insufficient input: need {} samples, have {}", needed, available),
			AcqErr::ShapeMismatch(s)                        => write!(f, "Shape mismatch: {}", s),
			AcqErr::TaskFailed(s)                           => write!(f, "Task failed: {}", s),
			AcqErr::Io(s)                                   => write!(f, "I/O error: {}", s),
		}
	}
}

impl std::error::Error for AcqErr {}
