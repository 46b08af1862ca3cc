mod error;
mod types;

pub use error::{Error, Result};
pub use types::{Config, Listing, Postgres, Security, Service, Storage};

use std::{fs, path::Path};

/// Upper bound on any page size, shared with the list engine.
pub const MAX_PAGE_LIMIT: u32 = 100;

pub fn load(path: &Path) -> Result<Config> {
	let raw = fs::read_to_string(path)
		.map_err(|err| Error::ReadConfig { path: path.to_path_buf(), source: err })?;
	let mut cfg: Config = toml::from_str(&raw)
		.map_err(|err| Error::ParseConfig { path: path.to_path_buf(), source: err })?;

	normalize(&mut cfg);
	validate(&cfg)?;

	Ok(cfg)
}

pub fn validate(cfg: &Config) -> Result<()> {
	if cfg.service.http_bind.trim().is_empty() {
		return Err(Error::Validation {
			message: "service.http_bind must be non-empty.".to_string(),
		});
	}
	if cfg.storage.postgres.dsn.trim().is_empty() {
		return Err(Error::Validation {
			message: "storage.postgres.dsn must be non-empty.".to_string(),
		});
	}
	if cfg.storage.postgres.pool_max_conns == 0 {
		return Err(Error::Validation {
			message: "storage.postgres.pool_max_conns must be greater than zero.".to_string(),
		});
	}
	if cfg.storage.postgres.acquire_timeout_ms == 0 {
		return Err(Error::Validation {
			message: "storage.postgres.acquire_timeout_ms must be greater than zero.".to_string(),
		});
	}

	for (label, limit) in [
		("listing.default_limit", cfg.listing.default_limit),
		("listing.tag_default_limit", cfg.listing.tag_default_limit),
		("listing.user_default_limit", cfg.listing.user_default_limit),
	] {
		if !(1..=MAX_PAGE_LIMIT).contains(&limit) {
			return Err(Error::Validation {
				message: format!("{label} must be in the range 1-{MAX_PAGE_LIMIT}."),
			});
		}
	}

	if cfg.security.identity_header.is_empty() {
		return Err(Error::Validation {
			message: "security.identity_header must be non-empty.".to_string(),
		});
	}
	if !cfg.security.identity_header.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-') {
		return Err(Error::Validation {
			message: "security.identity_header must contain only ASCII letters, digits, and '-'."
				.to_string(),
		});
	}

	Ok(())
}

fn normalize(cfg: &mut Config) {
	cfg.security.identity_header = cfg.security.identity_header.trim().to_ascii_lowercase();

	if cfg.service.log_level.trim().is_empty() {
		cfg.service.log_level = "info".to_string();
	}
}
