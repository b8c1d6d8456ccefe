use attend_storage::models::FaceEncoding;

use crate::{Error, Result};

#[derive(Debug, Clone, Copy)]
pub struct Nearest<'a> {
	pub record: &'a FaceEncoding,
	pub distance: f32,
}

/// Finds the stored encoding closest to `query`, if it is strictly closer than `threshold`.
///
/// Equal distances resolve to the record that appears first in `records`. A record whose
/// dimensionality differs from `query` is an error, never a partial comparison.
pub trait NearestNeighbor
where
	Self: Send + Sync,
{
	fn nearest_within_threshold<'a>(
		&self,
		query: &[f32],
		records: &'a [FaceEncoding],
		threshold: f32,
	) -> Result<Option<Nearest<'a>>>;
}

/// Full O(N·D) scan over every record.
pub struct LinearScan;
impl NearestNeighbor for LinearScan {
	fn nearest_within_threshold<'a>(
		&self,
		query: &[f32],
		records: &'a [FaceEncoding],
		threshold: f32,
	) -> Result<Option<Nearest<'a>>> {
		let mut best: Option<Nearest<'a>> = None;

		for record in records {
			let distance = euclidean_distance(query, &record.embedding).ok_or_else(|| {
				Error::DimensionMismatch {
					identifier: record.identifier.clone(),
					query: query.len(),
					stored: record.embedding.len(),
				}
			})?;
			let best_distance = best.map(|nearest| nearest.distance).unwrap_or(f32::INFINITY);

			if distance < best_distance {
				best = Some(Nearest { record, distance });
			}
		}

		Ok(best.filter(|nearest| nearest.distance < threshold))
	}
}

/// `None` when the vectors differ in length.
pub fn euclidean_distance(a: &[f32], b: &[f32]) -> Option<f32> {
	if a.len() != b.len() {
		return None;
	}

	Some(a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum::<f32>().sqrt())
}
