use std::{io, path::PathBuf};

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Cannot read Singular config {}: {source}", path.display())]
	ReadConfig { path: PathBuf, source: io::Error },
	/// Carries the TOML diagnostic, which names the offending line and key.
	#[error("Singular config {} is not valid TOML: {source}", path.display())]
	ParseConfig { path: PathBuf, source: toml::de::Error },
	#[error("Invalid Singular config: {message}")]
	Validation { message: String },
}
