use serde::Deserialize;
use serde_json::{Map, Value};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
	pub service: Service,
	pub storage: Storage,
	pub providers: Providers,
	#[serde(default)]
	pub matcher: Matcher,
	#[serde(default)]
	pub attendance: Attendance,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Service {
	pub http_bind: String,
	pub log_level: String,
	#[serde(default = "default_max_upload_bytes")]
	pub max_upload_bytes: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Storage {
	pub postgres: Postgres,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Postgres {
	/// Filled from `CONNECTION_URL` at load time; never read from the file.
	#[serde(skip)]
	pub dsn: String,
	pub pool_max_conns: u32,
	pub acquire_timeout_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Providers {
	pub face: FaceProviderConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FaceProviderConfig {
	pub provider_id: String,
	pub api_base: String,
	pub api_key: Option<String>,
	pub path: String,
	pub model: String,
	pub detector_backend: String,
	pub dimensions: u32,
	pub timeout_ms: u64,
	#[serde(default)]
	pub reject_multiple_faces: bool,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Matcher {
	#[serde(default = "default_threshold")]
	pub threshold: f32,
}
impl Default for Matcher {
	fn default() -> Self {
		Self { threshold: default_threshold() }
	}
}

#[derive(Debug, Clone, Deserialize)]
pub struct Attendance {
	#[serde(default = "default_timezone")]
	pub timezone: String,
	/// Fixed offset in `+HH:MM` form.
	#[serde(default = "default_utc_offset")]
	pub utc_offset: String,
}
impl Default for Attendance {
	fn default() -> Self {
		Self { timezone: default_timezone(), utc_offset: default_utc_offset() }
	}
}

fn default_max_upload_bytes() -> usize {
	10 * 1024 * 1024
}

fn default_threshold() -> f32 {
	0.6
}

fn default_timezone() -> String {
	"Asia/Kolkata".to_string()
}

fn default_utc_offset() -> String {
	"+05:30".to_string()
}
