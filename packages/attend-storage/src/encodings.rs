use crate::{Error, Result, db::Db, models::FaceEncoding};

pub async fn insert_encoding(db: &Db, encoding: &FaceEncoding) -> Result<()> {
	if encoding.embedding.is_empty() {
		return Err(Error::InvalidArgument("Embedding must not be empty.".to_string()));
	}

	let embedding_dim = i32::try_from(encoding.embedding.len())
		.map_err(|_| Error::InvalidArgument("Embedding is too large.".to_string()))?;

	sqlx::query(
		"\
INSERT INTO face_encodings (
	encoding_id,
	identifier,
	embedding,
	embedding_dim,
	created_at
)
VALUES ($1, $2, $3, $4, $5)",
	)
	.bind(encoding.encoding_id)
	.bind(encoding.identifier.as_str())
	.bind(encoding.embedding.as_slice())
	.bind(embedding_dim)
	.bind(encoding.created_at)
	.execute(&db.pool)
	.await?;

	Ok(())
}

/// Every stored encoding in insertion order.
pub async fn list_encodings(db: &Db) -> Result<Vec<FaceEncoding>> {
	let rows = sqlx::query_as::<_, FaceEncoding>(
		"\
SELECT encoding_id, identifier, embedding, created_at
FROM face_encodings
ORDER BY seq ASC",
	)
	.fetch_all(&db.pool)
	.await?;

	Ok(rows)
}
