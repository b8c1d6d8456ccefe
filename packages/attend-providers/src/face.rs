use std::time::Duration;

use reqwest::{
	Client, StatusCode,
	multipart::{Form, Part},
};
use serde_json::Value;

use crate::{Error, Result};
use attend_config::FaceProviderConfig;

#[derive(Debug, Clone, PartialEq)]
pub enum Detection {
	Face(Vec<f32>),
	NoFace,
}

pub async fn represent(
	cfg: &FaceProviderConfig,
	file_name: &str,
	image: &[u8],
) -> Result<Detection> {
	let client = Client::builder().timeout(Duration::from_millis(cfg.timeout_ms)).build()?;
	let url = format!("{}{}", cfg.api_base.trim_end_matches('/'), cfg.path);
	let form = Form::new()
		.part("img", Part::bytes(image.to_vec()).file_name(file_name.to_string()))
		.text("model_name", cfg.model.clone())
		.text("detector_backend", cfg.detector_backend.clone())
		.text("enforce_detection", "true");
	let res = client
		.post(url)
		.headers(crate::auth_headers(cfg.api_key.as_deref(), &cfg.default_headers)?)
		.multipart(form)
		.send()
		.await?;
	let status = res.status();

	// The representation service answers 400/422 when enforce_detection finds no face.
	if status == StatusCode::BAD_REQUEST || status == StatusCode::UNPROCESSABLE_ENTITY {
		let body = res.text().await.unwrap_or_default();

		tracing::warn!(
			provider_id = %cfg.provider_id,
			model = %cfg.model,
			detector_backend = %cfg.detector_backend,
			%status,
			%body,
			"Face provider rejected the image as having no detectable face."
		);

		return Ok(Detection::NoFace);
	}

	let json: Value = res.error_for_status()?.json().await?;

	parse_represent_response(json, cfg.dimensions as usize, cfg.reject_multiple_faces)
}

fn parse_represent_response(
	json: Value,
	dimensions: usize,
	reject_multiple_faces: bool,
) -> Result<Detection> {
	let results = json.get("results").and_then(|v| v.as_array()).ok_or_else(|| {
		Error::InvalidResponse { message: "Face response is missing results array.".to_string() }
	})?;
	let Some(first) = results.first() else {
		return Ok(Detection::NoFace);
	};

	if results.len() > 1 {
		if reject_multiple_faces {
			tracing::debug!(faces = results.len(), "Rejecting image with multiple faces.");

			return Ok(Detection::NoFace);
		}

		tracing::debug!(faces = results.len(), "Using the first of multiple detected faces.");
	}

	let embedding = first.get("embedding").and_then(|v| v.as_array()).ok_or_else(|| {
		Error::InvalidResponse { message: "Face result is missing embedding array.".to_string() }
	})?;

	if embedding.len() != dimensions {
		return Err(Error::InvalidResponse {
			message: format!(
				"Face embedding has {} dimensions; expected {dimensions}.",
				embedding.len()
			),
		});
	}

	let mut vec = Vec::with_capacity(embedding.len());

	for value in embedding {
		let number = value.as_f64().ok_or_else(|| Error::InvalidResponse {
			message: "Face embedding value must be numeric.".to_string(),
		})?;

		vec.push(number as f32);
	}

	Ok(Detection::Face(vec))
}
