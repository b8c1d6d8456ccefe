pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Invalid request: {message}")]
	InvalidRequest { message: String },
	#[error("Configuration error: {message}")]
	Config { message: String },
	#[error("Extractor error: {message}")]
	Extractor { message: String },
	#[error("Internal error: {message}")]
	Internal { message: String },
	#[error("Store unavailable: {message}")]
	StoreUnavailable { message: String },
	#[error(
		"Embedding dimension mismatch for {identifier:?}: query has {query} values, stored has {stored}."
	)]
	DimensionMismatch { identifier: String, query: usize, stored: usize },
}
impl From<attend_storage::Error> for Error {
	fn from(err: attend_storage::Error) -> Self {
		match err {
			attend_storage::Error::Sqlx(inner) => Self::StoreUnavailable { message: inner.to_string() },
			attend_storage::Error::InvalidArgument(message) => Self::InvalidRequest { message },
		}
	}
}

impl From<attend_providers::Error> for Error {
	fn from(err: attend_providers::Error) -> Self {
		Self::Extractor { message: err.to_string() }
	}
}

impl From<attend_config::Error> for Error {
	fn from(err: attend_config::Error) -> Self {
		Self::Config { message: err.to_string() }
	}
}
