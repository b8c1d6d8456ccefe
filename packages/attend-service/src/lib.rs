pub mod attendance;
pub mod face_match;
pub mod identifier;
pub mod nearest;
pub mod register;

mod error;

pub use error::{Error, Result};
pub use face_match::{FaceMatch, MatchOutcome, MatchRequest};
pub use nearest::{LinearScan, Nearest, NearestNeighbor};
pub use register::{RegisterOutcome, RegisterRequest};

use std::{future::Future, pin::Pin, sync::Arc};

use time::UtcOffset;

use attend_config::{Config, FaceProviderConfig};
use attend_providers::face::{self, Detection};
use attend_storage::{
	attendance as attendance_queries,
	db::Db,
	encodings as encoding_queries,
	models::{AttendanceRecord, FaceEncoding},
};

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

pub trait FaceExtractor
where
	Self: Send + Sync,
{
	fn extract<'a>(
		&'a self,
		cfg: &'a FaceProviderConfig,
		file_name: &'a str,
		image: &'a [u8],
	) -> BoxFuture<'a, attend_providers::Result<Detection>>;
}

/// Append-only; `get_all` returns records in insertion order.
pub trait EncodingStore
where
	Self: Send + Sync,
{
	fn put<'a>(&'a self, encoding: &'a FaceEncoding) -> BoxFuture<'a, attend_storage::Result<()>>;

	fn get_all(&self) -> BoxFuture<'_, attend_storage::Result<Vec<FaceEncoding>>>;
}

pub trait AttendanceLog
where
	Self: Send + Sync,
{
	fn record<'a>(
		&'a self,
		record: &'a AttendanceRecord,
	) -> BoxFuture<'a, attend_storage::Result<()>>;
}

#[derive(Clone)]
pub struct Providers {
	pub face: Arc<dyn FaceExtractor>,
}
impl Providers {
	pub fn new(face: Arc<dyn FaceExtractor>) -> Self {
		Self { face }
	}
}
impl Default for Providers {
	fn default() -> Self {
		Self { face: Arc::new(HttpFaceExtractor) }
	}
}

#[derive(Clone)]
pub struct Stores {
	pub encodings: Arc<dyn EncodingStore>,
	pub attendance: Arc<dyn AttendanceLog>,
}
impl Stores {
	pub fn new(encodings: Arc<dyn EncodingStore>, attendance: Arc<dyn AttendanceLog>) -> Self {
		Self { encodings, attendance }
	}

	pub fn postgres(db: Db) -> Self {
		let stores = Arc::new(PgStores { db });

		Self { encodings: stores.clone(), attendance: stores }
	}
}

pub struct AttendService {
	pub cfg: Config,
	pub providers: Providers,
	pub stores: Stores,
	pub nearest: Arc<dyn NearestNeighbor>,
	utc_offset: UtcOffset,
}
impl AttendService {
	pub fn new(cfg: Config, db: Db) -> Result<Self> {
		Self::with_parts(cfg, Providers::default(), Stores::postgres(db))
	}

	pub fn with_parts(cfg: Config, providers: Providers, stores: Stores) -> Result<Self> {
		let utc_offset = attend_config::utc_offset(&cfg.attendance)?;

		Ok(Self { cfg, providers, stores, nearest: Arc::new(LinearScan), utc_offset })
	}

	pub fn with_nearest(mut self, nearest: Arc<dyn NearestNeighbor>) -> Self {
		self.nearest = nearest;

		self
	}
}

struct HttpFaceExtractor;
impl FaceExtractor for HttpFaceExtractor {
	fn extract<'a>(
		&'a self,
		cfg: &'a FaceProviderConfig,
		file_name: &'a str,
		image: &'a [u8],
	) -> BoxFuture<'a, attend_providers::Result<Detection>> {
		Box::pin(face::represent(cfg, file_name, image))
	}
}

struct PgStores {
	db: Db,
}
impl EncodingStore for PgStores {
	fn put<'a>(&'a self, encoding: &'a FaceEncoding) -> BoxFuture<'a, attend_storage::Result<()>> {
		Box::pin(encoding_queries::insert_encoding(&self.db, encoding))
	}

	fn get_all(&self) -> BoxFuture<'_, attend_storage::Result<Vec<FaceEncoding>>> {
		Box::pin(encoding_queries::list_encodings(&self.db))
	}
}
impl AttendanceLog for PgStores {
	fn record<'a>(
		&'a self,
		record: &'a AttendanceRecord,
	) -> BoxFuture<'a, attend_storage::Result<()>> {
		Box::pin(attendance_queries::insert_attendance(&self.db, record))
	}
}
