use crate::{Error, Result};

/// Everything before the first `.`; `bob.jpg.png` becomes `bob`.
pub fn strip_extension(name: &str) -> &str {
	name.split_once('.').map(|(head, _)| head).unwrap_or(name)
}

pub fn derive_identifier(file_name: &str) -> Result<String> {
	let identifier = strip_extension(file_name);

	if identifier.trim().is_empty() {
		return Err(Error::InvalidRequest {
			message: "Filename must contain an identifier before the first '.'.".to_string(),
		});
	}

	Ok(identifier.to_string())
}
