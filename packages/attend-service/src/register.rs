use time::OffsetDateTime;
use uuid::Uuid;

use attend_providers::face::Detection;
use attend_storage::models::FaceEncoding;

use crate::{AttendService, Error, Result, identifier};

#[derive(Debug, Clone)]
pub struct RegisterRequest {
	pub file_name: String,
	pub image: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RegisterOutcome {
	Registered { identifier: String, encoding_id: Uuid },
	NoFaceDetected,
}

impl AttendService {
	pub async fn register(&self, req: RegisterRequest) -> Result<RegisterOutcome> {
		let identifier = identifier::derive_identifier(&req.file_name)?;
		let Some(embedding) = self.extract(&req.file_name, &req.image).await? else {
			tracing::info!(%identifier, "Registration skipped; no face detected.");

			return Ok(RegisterOutcome::NoFaceDetected);
		};
		let encoding = FaceEncoding {
			encoding_id: Uuid::new_v4(),
			identifier,
			embedding,
			created_at: OffsetDateTime::now_utc(),
		};

		self.stores.encodings.put(&encoding).await?;

		tracing::info!(
			identifier = %encoding.identifier,
			encoding_id = %encoding.encoding_id,
			"Face registered."
		);

		Ok(RegisterOutcome::Registered {
			identifier: encoding.identifier,
			encoding_id: encoding.encoding_id,
		})
	}

	/// `None` when the extractor finds no usable face.
	pub(crate) async fn extract(&self, file_name: &str, image: &[u8]) -> Result<Option<Vec<f32>>> {
		let cfg = &self.cfg.providers.face;

		match self.providers.face.extract(cfg, file_name, image).await? {
			Detection::NoFace => Ok(None),
			Detection::Face(embedding) => {
				if embedding.len() != cfg.dimensions as usize {
					return Err(Error::Extractor {
						message: format!(
							"Face embedding has {} dimensions; expected {}.",
							embedding.len(),
							cfg.dimensions
						),
					});
				}

				Ok(Some(embedding))
			},
		}
	}
}
