use std::sync::Arc;

use attend_service::AttendService;
use attend_storage::db::Db;

#[derive(Clone)]
pub struct AppState {
	pub service: Arc<AttendService>,
}
impl AppState {
	pub async fn new(config: attend_config::Config) -> color_eyre::Result<Self> {
		let db = Db::connect(&config.storage.postgres).await?;

		db.ensure_schema().await?;

		let service = AttendService::new(config, db)?;

		Ok(Self::from_service(service))
	}

	pub fn from_service(service: AttendService) -> Self {
		Self { service: Arc::new(service) }
	}
}
