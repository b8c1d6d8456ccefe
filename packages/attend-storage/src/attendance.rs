use crate::{Result, db::Db, models::AttendanceRecord};

pub async fn insert_attendance(db: &Db, record: &AttendanceRecord) -> Result<()> {
	sqlx::query(
		"\
INSERT INTO attendance_records (
	record_id,
	collection,
	identifier,
	status,
	date,
	time,
	recorded_at
)
VALUES ($1, $2, $3, $4, $5, $6, $7)",
	)
	.bind(record.record_id)
	.bind(record.collection.as_str())
	.bind(record.identifier.as_str())
	.bind(record.status.as_str())
	.bind(record.date.as_str())
	.bind(record.time.as_str())
	.bind(record.recorded_at)
	.execute(&db.pool)
	.await?;

	Ok(())
}

pub async fn list_attendance_for_day(db: &Db, collection: &str) -> Result<Vec<AttendanceRecord>> {
	let rows = sqlx::query_as::<_, AttendanceRecord>(
		"\
SELECT record_id, collection, identifier, status, date, time, recorded_at
FROM attendance_records
WHERE collection = $1
ORDER BY recorded_at ASC, record_id ASC",
	)
	.bind(collection)
	.fetch_all(&db.pool)
	.await?;

	Ok(rows)
}
