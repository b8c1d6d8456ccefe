mod error;
mod types;

pub use error::{Error, Result};
pub use types::{
	Attendance, Config, FaceProviderConfig, Matcher, Postgres, Providers, Service, Storage,
};

use std::{env, fs, path::Path};

use time::{UtcOffset, macros::format_description};

pub const CONNECTION_URL_ENV: &str = "CONNECTION_URL";
pub const PORT_ENV: &str = "PORT";

pub fn load(path: &Path) -> Result<Config> {
	load_with(path, |name| env::var(name).ok())
}

pub fn load_with<F>(path: &Path, lookup: F) -> Result<Config>
where
	F: Fn(&str) -> Option<String>,
{
	let raw = fs::read_to_string(path)
		.map_err(|err| Error::ReadConfig { path: path.to_path_buf(), source: err })?;
	let mut cfg: Config = toml::from_str(&raw)
		.map_err(|err| Error::ParseConfig { path: path.to_path_buf(), source: err })?;

	apply_env(&mut cfg, lookup)?;
	normalize(&mut cfg);
	validate(&cfg)?;

	Ok(cfg)
}

pub fn apply_env<F>(cfg: &mut Config, lookup: F) -> Result<()>
where
	F: Fn(&str) -> Option<String>,
{
	let dsn = lookup(CONNECTION_URL_ENV)
		.filter(|value| !value.trim().is_empty())
		.ok_or(Error::MissingEnv { name: CONNECTION_URL_ENV })?;

	cfg.storage.postgres.dsn = dsn;

	if let Some(raw_port) = lookup(PORT_ENV).filter(|value| !value.trim().is_empty()) {
		let port: u16 = raw_port.trim().parse().map_err(|_| Error::Validation {
			message: format!("{PORT_ENV} must be a valid port number."),
		})?;
		let host = cfg
			.service
			.http_bind
			.rsplit_once(':')
			.map(|(host, _)| host.to_string())
			.unwrap_or_else(|| cfg.service.http_bind.clone());

		cfg.service.http_bind = format!("{host}:{port}");
	}

	Ok(())
}

pub fn validate(cfg: &Config) -> Result<()> {
	if cfg.service.http_bind.trim().is_empty() {
		return Err(Error::Validation {
			message: "service.http_bind must be non-empty.".to_string(),
		});
	}
	if cfg.service.max_upload_bytes == 0 {
		return Err(Error::Validation {
			message: "service.max_upload_bytes must be greater than zero.".to_string(),
		});
	}
	if cfg.storage.postgres.dsn.trim().is_empty() {
		return Err(Error::MissingEnv { name: CONNECTION_URL_ENV });
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

	let face = &cfg.providers.face;

	if face.api_base.trim().is_empty() {
		return Err(Error::Validation {
			message: "providers.face.api_base must be non-empty.".to_string(),
		});
	}
	if face.dimensions == 0 {
		return Err(Error::Validation {
			message: "providers.face.dimensions must be greater than zero.".to_string(),
		});
	}
	if face.timeout_ms == 0 {
		return Err(Error::Validation {
			message: "providers.face.timeout_ms must be greater than zero.".to_string(),
		});
	}
	if face.default_headers.values().any(|value| !value.is_string()) {
		return Err(Error::Validation {
			message: "providers.face.default_headers values must be strings.".to_string(),
		});
	}
	if !cfg.matcher.threshold.is_finite() {
		return Err(Error::Validation {
			message: "matcher.threshold must be a finite number.".to_string(),
		});
	}
	if cfg.matcher.threshold <= 0.0 {
		return Err(Error::Validation {
			message: "matcher.threshold must be greater than zero.".to_string(),
		});
	}

	utc_offset(&cfg.attendance)?;

	Ok(())
}

pub fn utc_offset(attendance: &Attendance) -> Result<UtcOffset> {
	UtcOffset::parse(
		attendance.utc_offset.trim(),
		format_description!("[offset_hour sign:mandatory]:[offset_minute]"),
	).map_err(|_| {
		Error::Validation {
			message: "attendance.utc_offset must look like +05:30.".to_string(),
		}
	})
}

fn normalize(cfg: &mut Config) {
	if cfg
		.providers
		.face
		.api_key
		.as_deref()
		.map(|key| key.trim().is_empty())
		.unwrap_or(false)
	{
		cfg.providers.face.api_key = None;
	}
}
