use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
	pub service: Service,
	pub storage: Storage,
	#[serde(default)]
	pub listing: Listing,
	#[serde(default)]
	pub security: Security,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Service {
	pub http_bind: String,
	#[serde(default = "default_log_level")]
	pub log_level: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Storage {
	pub postgres: Postgres,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Postgres {
	pub dsn: String,
	pub pool_max_conns: u32,
	#[serde(default = "default_acquire_timeout_ms")]
	pub acquire_timeout_ms: u64,
}

/// Page sizes applied when a list request omits `limit`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Listing {
	pub default_limit: u32,
	pub tag_default_limit: u32,
	pub user_default_limit: u32,
}
impl Default for Listing {
	fn default() -> Self {
		Self { default_limit: 20, tag_default_limit: 50, user_default_limit: 25 }
	}
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Security {
	pub bind_localhost_only: bool,
	/// Header set by the fronting auth layer with the caller's user id.
	pub identity_header: String,
}
impl Default for Security {
	fn default() -> Self {
		Self { bind_localhost_only: true, identity_header: default_identity_header() }
	}
}

fn default_log_level() -> String {
	"info".to_string()
}

fn default_acquire_timeout_ms() -> u64 {
	5_000
}

fn default_identity_header() -> String {
	"x-singular-user-id".to_string()
}
