use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct FaceEncoding {
	pub encoding_id: Uuid,
	pub identifier: String,
	pub embedding: Vec<f32>,
	pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct AttendanceRecord {
	pub record_id: Uuid,
	/// Day collection name, `DD/MM/YYYY`.
	pub collection: String,
	pub identifier: String,
	pub status: String,
	pub date: String,
	pub time: String,
	pub recorded_at: OffsetDateTime,
}
