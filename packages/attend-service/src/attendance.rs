use time::{OffsetDateTime, UtcOffset, macros::format_description};
use uuid::Uuid;

use attend_storage::models::AttendanceRecord;

use crate::{AttendService, Error, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttendanceStamp {
	/// `DD/MM/YYYY`, also the name of the day collection.
	pub date: String,
	/// `HH:MM:SS`.
	pub time: String,
}

pub fn stamp(now: OffsetDateTime, offset: UtcOffset) -> Result<AttendanceStamp> {
	let local = now.to_offset(offset);
	let date = local.format(format_description!("[day]/[month]/[year]")).map_err(format_error)?;
	let time = local.format(format_description!("[hour]:[minute]:[second]")).map_err(format_error)?;

	Ok(AttendanceStamp { date, time })
}

fn format_error(err: time::error::Format) -> Error {
	Error::Internal { message: format!("Failed to format attendance time: {err}.") }
}

impl AttendService {
	/// Appends one record to the collection for `now`'s local day. Repeat calls are all kept.
	pub async fn record_attendance(
		&self,
		identifier: &str,
		status: &str,
		now: OffsetDateTime,
	) -> Result<AttendanceRecord> {
		let AttendanceStamp { date, time } = stamp(now, self.utc_offset)?;
		let record = AttendanceRecord {
			record_id: Uuid::new_v4(),
			collection: date.clone(),
			identifier: identifier.to_string(),
			status: status.to_string(),
			date,
			time,
			recorded_at: now,
		};

		self.stores.attendance.record(&record).await?;

		tracing::info!(
			identifier = %record.identifier,
			collection = %record.collection,
			time = %record.time,
			timezone = %self.cfg.attendance.timezone,
			"Attendance recorded."
		);

		Ok(record)
	}
}
