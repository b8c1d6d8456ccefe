use time::OffsetDateTime;

use attend_storage::models::AttendanceRecord;

use crate::{AttendService, Result, identifier};

#[derive(Debug, Clone)]
pub struct MatchRequest {
	pub file_name: String,
	pub image: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FaceMatch {
	pub identifier: String,
	pub distance: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub enum MatchOutcome {
	Matched {
		face: FaceMatch,
		/// `None` when the match stood but the attendance write failed.
		attendance: Option<AttendanceRecord>,
	},
	NoMatch,
}

impl AttendService {
	/// Identifies the face in `image` against every stored encoding.
	///
	/// A face that cannot be detected is reported the same way as a face that matches nobody.
	pub async fn match_face(
		&self,
		file_name: &str,
		image: &[u8],
		threshold: f32,
	) -> Result<Option<FaceMatch>> {
		let Some(query) = self.extract(file_name, image).await? else {
			tracing::debug!(file_name, "No face detected in match request.");

			return Ok(None);
		};
		let records = self.stores.encodings.get_all().await?;

		if records.is_empty() {
			tracing::debug!("Encoding store is empty.");

			return Ok(None);
		}

		let nearest = self.nearest.nearest_within_threshold(&query, &records, threshold)?;

		Ok(nearest.map(|nearest| FaceMatch {
			identifier: identifier::strip_extension(&nearest.record.identifier).to_string(),
			distance: nearest.distance,
		}))
	}

	pub async fn face_match(&self, req: MatchRequest) -> Result<MatchOutcome> {
		let threshold = self.cfg.matcher.threshold;
		let Some(face) = self.match_face(&req.file_name, &req.image, threshold).await? else {
			tracing::info!(file_name = %req.file_name, threshold, "No matching face.");

			return Ok(MatchOutcome::NoMatch);
		};

		tracing::info!(
			identifier = %face.identifier,
			distance = face.distance,
			threshold,
			"Face matched."
		);

		let attendance = match self
			.record_attendance(&face.identifier, &req.file_name, OffsetDateTime::now_utc())
			.await
		{
			Ok(record) => Some(record),
			Err(err) => {
				tracing::error!(
					error = %err,
					identifier = %face.identifier,
					"Failed to record attendance."
				);

				None
			},
		};

		Ok(MatchOutcome::Matched { face, attendance })
	}
}
