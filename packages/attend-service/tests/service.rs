use std::{
	collections::HashMap,
	sync::{
		Arc, Mutex,
		atomic::{AtomicBool, AtomicUsize, Ordering},
	},
};

use serde_json::Map;

use attend_config::{
	Attendance, Config, FaceProviderConfig, Matcher, Postgres, Providers as ProviderConfigs,
	Service, Storage,
};
use attend_providers::face::Detection;
use attend_service::{
	AttendService, AttendanceLog, BoxFuture, EncodingStore, Error, FaceExtractor, MatchOutcome,
	MatchRequest, Providers, RegisterOutcome, RegisterRequest, Stores,
};
use attend_storage::models::{AttendanceRecord, FaceEncoding};

const DIM: usize = 4;

fn test_config() -> Config {
	Config {
		service: Service {
			http_bind: "127.0.0.1:0".to_string(),
			log_level: "info".to_string(),
			max_upload_bytes: 1_048_576,
		},
		storage: Storage {
			postgres: Postgres {
				dsn: "postgres://unused".to_string(),
				pool_max_conns: 1,
				acquire_timeout_ms: 1_000,
			},
		},
		providers: ProviderConfigs {
			face: FaceProviderConfig {
				provider_id: "test".to_string(),
				api_base: "http://127.0.0.1:1".to_string(),
				api_key: None,
				path: "/represent".to_string(),
				model: "test".to_string(),
				detector_backend: "test".to_string(),
				dimensions: DIM as u32,
				timeout_ms: 1_000,
				reject_multiple_faces: false,
				default_headers: Map::new(),
			},
		},
		matcher: Matcher { threshold: 0.6 },
		attendance: Attendance {
			timezone: "Asia/Kolkata".to_string(),
			utc_offset: "+05:30".to_string(),
		},
	}
}

/// Maps uploaded image bytes to a canned detection.
#[derive(Default)]
struct ScriptedExtractor {
	faces: Mutex<HashMap<Vec<u8>, Vec<f32>>>,
	fail: AtomicBool,
	calls: AtomicUsize,
}
impl ScriptedExtractor {
	fn with_face(self, image: &[u8], embedding: Vec<f32>) -> Self {
		self.faces.lock().expect("lock").insert(image.to_vec(), embedding);

		self
	}
}
impl FaceExtractor for ScriptedExtractor {
	fn extract<'a>(
		&'a self,
		_cfg: &'a FaceProviderConfig,
		_file_name: &'a str,
		image: &'a [u8],
	) -> BoxFuture<'a, attend_providers::Result<Detection>> {
		self.calls.fetch_add(1, Ordering::SeqCst);

		let result = if self.fail.load(Ordering::SeqCst) {
			Err(attend_providers::Error::InvalidResponse {
				message: "Extractor crashed.".to_string(),
			})
		} else {
			Ok(match self.faces.lock().expect("lock").get(image) {
				Some(embedding) => Detection::Face(embedding.clone()),
				None => Detection::NoFace,
			})
		};

		Box::pin(async move { result })
	}
}

#[derive(Default)]
struct MemoryStore {
	encodings: Mutex<Vec<FaceEncoding>>,
	attendance: Mutex<Vec<AttendanceRecord>>,
	encodings_down: AtomicBool,
	attendance_down: AtomicBool,
}
impl MemoryStore {
	fn encodings(&self) -> Vec<FaceEncoding> {
		self.encodings.lock().expect("lock").clone()
	}

	fn attendance(&self) -> Vec<AttendanceRecord> {
		self.attendance.lock().expect("lock").clone()
	}

	fn seed(&self, identifier: &str, embedding: Vec<f32>) {
		self.encodings.lock().expect("lock").push(FaceEncoding {
			encoding_id: uuid::Uuid::new_v4(),
			identifier: identifier.to_string(),
			embedding,
			created_at: time::OffsetDateTime::now_utc(),
		});
	}
}
impl EncodingStore for MemoryStore {
	fn put<'a>(&'a self, encoding: &'a FaceEncoding) -> BoxFuture<'a, attend_storage::Result<()>> {
		let result = if self.encodings_down.load(Ordering::SeqCst) {
			Err(attend_storage::Error::Sqlx(sqlx::Error::PoolTimedOut))
		} else {
			self.encodings.lock().expect("lock").push(encoding.clone());

			Ok(())
		};

		Box::pin(async move { result })
	}

	fn get_all(&self) -> BoxFuture<'_, attend_storage::Result<Vec<FaceEncoding>>> {
		let result = if self.encodings_down.load(Ordering::SeqCst) {
			Err(attend_storage::Error::Sqlx(sqlx::Error::PoolTimedOut))
		} else {
			Ok(self.encodings())
		};

		Box::pin(async move { result })
	}
}
impl AttendanceLog for MemoryStore {
	fn record<'a>(
		&'a self,
		record: &'a AttendanceRecord,
	) -> BoxFuture<'a, attend_storage::Result<()>> {
		let result = if self.attendance_down.load(Ordering::SeqCst) {
			Err(attend_storage::Error::Sqlx(sqlx::Error::PoolTimedOut))
		} else {
			self.attendance.lock().expect("lock").push(record.clone());

			Ok(())
		};

		Box::pin(async move { result })
	}
}

fn service(extractor: ScriptedExtractor) -> (AttendService, Arc<ScriptedExtractor>, Arc<MemoryStore>) {
	let extractor = Arc::new(extractor);
	let store = Arc::new(MemoryStore::default());
	let service = AttendService::with_parts(
		test_config(),
		Providers::new(extractor.clone()),
		Stores::new(store.clone(), store.clone()),
	)
	.expect("Failed to build service.");

	(service, extractor, store)
}

fn register_req(file_name: &str, image: &[u8]) -> RegisterRequest {
	RegisterRequest { file_name: file_name.to_string(), image: image.to_vec() }
}

fn match_req(file_name: &str, image: &[u8]) -> MatchRequest {
	MatchRequest { file_name: file_name.to_string(), image: image.to_vec() }
}

#[tokio::test]
async fn register_then_match_same_image_round_trips() {
	let embedding = vec![0.1, 0.2, 0.3, 0.4];
	let (service, _, store) = service(ScriptedExtractor::default().with_face(b"alice", embedding));
	let outcome = service.register(register_req("alice.png", b"alice")).await.expect("register");

	assert!(matches!(outcome, RegisterOutcome::Registered { ref identifier, .. } if identifier == "alice"));
	assert_eq!(store.encodings().len(), 1);

	let outcome = service.face_match(match_req("alice.png", b"alice")).await.expect("match");
	let MatchOutcome::Matched { face, attendance } = outcome else {
		panic!("Expected a match, got {outcome:?}.");
	};

	assert_eq!(face.identifier, "alice");
	assert_eq!(face.distance, 0.0);
	assert!(attendance.is_some());
}

#[tokio::test]
async fn carol_scenario_records_attendance_for_today() {
	let registered = vec![0.1, 0.2, 0.3, 0.4];
	let nearby = vec![0.15, 0.2, 0.3, 0.4];
	let (service, _, store) = service(
		ScriptedExtractor::default()
			.with_face(b"carol-enrol", registered)
			.with_face(b"carol-today", nearby),
	);

	service.register(register_req("carol.jpg", b"carol-enrol")).await.expect("register");

	let outcome = service.face_match(match_req("gate-3.jpg", b"carol-today")).await.expect("match");

	assert!(matches!(outcome, MatchOutcome::Matched { ref face, .. } if face.identifier == "carol"));

	let attendance = store.attendance();

	assert_eq!(attendance.len(), 1);
	assert_eq!(attendance[0].identifier, "carol");
	assert_eq!(attendance[0].status, "gate-3.jpg");
	assert_eq!(attendance[0].collection, attendance[0].date);

	let expected = attend_service::attendance::stamp(
		attendance[0].recorded_at,
		time::macros::offset!(+05:30),
	)
	.expect("stamp");

	assert_eq!(attendance[0].date, expected.date);
	assert_eq!(attendance[0].time, expected.time);
}

#[tokio::test]
async fn empty_store_never_matches_or_records() {
	let (service, _, store) = service(ScriptedExtractor::default().with_face(b"x", vec![0.0; DIM]));
	let outcome = service.face_match(match_req("x.png", b"x")).await.expect("match");

	assert_eq!(outcome, MatchOutcome::NoMatch);
	assert!(store.attendance().is_empty());
}

#[tokio::test]
async fn undetectable_face_is_no_match() {
	let (service, _, store) = service(ScriptedExtractor::default());

	store.seed("alice", vec![0.0; DIM]);

	let outcome = service.face_match(match_req("blurry.png", b"blurry")).await.expect("match");

	assert_eq!(outcome, MatchOutcome::NoMatch);
	assert!(store.attendance().is_empty());
}

#[tokio::test]
async fn undetectable_face_is_not_registered() {
	let (service, _, store) = service(ScriptedExtractor::default());
	let outcome = service.register(register_req("ghost.png", b"ghost")).await.expect("register");

	assert_eq!(outcome, RegisterOutcome::NoFaceDetected);
	assert!(store.encodings().is_empty());
}

#[tokio::test]
async fn distance_at_threshold_is_no_match() {
	let (service, _, store) =
		service(ScriptedExtractor::default().with_face(b"query", vec![0.0; DIM]));

	store.seed("edge", vec![0.5, 0.0, 0.0, 0.0]);

	let at_threshold = service.match_face("query.png", b"query", 0.5).await.expect("match");
	let above_threshold = service.match_face("query.png", b"query", 0.75).await.expect("match");

	assert!(at_threshold.is_none());
	assert_eq!(above_threshold.map(|face| face.identifier), Some("edge".to_string()));
}

#[tokio::test]
async fn ties_resolve_to_first_stored_record() {
	let (service, _, store) =
		service(ScriptedExtractor::default().with_face(b"query", vec![0.0; DIM]));

	store.seed("first", vec![0.25, 0.0, 0.0, 0.0]);
	store.seed("second", vec![0.0, 0.25, 0.0, 0.0]);

	let face = service
		.match_face("query.png", b"query", 0.6)
		.await
		.expect("match")
		.expect("Expected a match.");

	assert_eq!(face.identifier, "first");
}

#[tokio::test]
async fn duplicate_identifiers_are_both_stored() {
	let (service, _, store) = service(
		ScriptedExtractor::default()
			.with_face(b"one", vec![0.1; DIM])
			.with_face(b"two", vec![0.9; DIM]),
	);

	service.register(register_req("dana.png", b"one")).await.expect("register");
	service.register(register_req("dana.jpeg", b"two")).await.expect("register");

	let identifiers = store.encodings().into_iter().map(|row| row.identifier).collect::<Vec<_>>();

	assert_eq!(identifiers, vec!["dana".to_string(), "dana".to_string()]);
}

#[tokio::test]
async fn repeat_matches_append_attendance() {
	let (service, _, store) =
		service(ScriptedExtractor::default().with_face(b"erin", vec![0.3; DIM]));

	store.seed("erin", vec![0.3; DIM]);

	for _ in 0..3 {
		service.face_match(match_req("erin.png", b"erin")).await.expect("match");
	}

	assert_eq!(store.attendance().len(), 3);
}

#[tokio::test]
async fn nested_extension_derives_first_segment() {
	let (service, _, store) =
		service(ScriptedExtractor::default().with_face(b"bob", vec![0.2; DIM]));

	service.register(register_req("bob.jpg.png", b"bob")).await.expect("register");

	assert_eq!(store.encodings()[0].identifier, "bob");
}

#[tokio::test]
async fn empty_identifier_is_rejected_before_extraction() {
	let (service, extractor, _) = service(ScriptedExtractor::default());
	let err = service.register(register_req(".png", b"x")).await.expect_err("expected rejection");

	assert!(matches!(err, Error::InvalidRequest { .. }));
	assert_eq!(extractor.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn extractor_failure_is_an_error() {
	let (service, extractor, _) = service(ScriptedExtractor::default());

	extractor.fail.store(true, Ordering::SeqCst);

	let register = service.register(register_req("alice.png", b"alice")).await;
	let matched = service.face_match(match_req("alice.png", b"alice")).await;

	assert!(matches!(register, Err(Error::Extractor { .. })));
	assert!(matches!(matched, Err(Error::Extractor { .. })));
}

#[tokio::test]
async fn wrong_extractor_dimension_is_an_error() {
	let (service, _, store) =
		service(ScriptedExtractor::default().with_face(b"short", vec![0.1, 0.2]));
	let err = service.register(register_req("short.png", b"short")).await.expect_err("expected error");

	assert!(matches!(err, Error::Extractor { .. }));
	assert!(store.encodings().is_empty());
}

#[tokio::test]
async fn store_outage_is_store_unavailable() {
	let (service, _, store) = service(ScriptedExtractor::default().with_face(b"a", vec![0.0; DIM]));

	store.encodings_down.store(true, Ordering::SeqCst);

	let register = service.register(register_req("a.png", b"a")).await;
	let matched = service.face_match(match_req("a.png", b"a")).await;

	assert!(matches!(register, Err(Error::StoreUnavailable { .. })));
	assert!(matches!(matched, Err(Error::StoreUnavailable { .. })));
}

#[tokio::test]
async fn attendance_failure_keeps_the_match() {
	let (service, _, store) =
		service(ScriptedExtractor::default().with_face(b"fay", vec![0.4; DIM]));

	store.seed("fay", vec![0.4; DIM]);
	store.attendance_down.store(true, Ordering::SeqCst);

	let outcome = service.face_match(match_req("fay.png", b"fay")).await.expect("match");

	assert!(matches!(
		outcome,
		MatchOutcome::Matched { ref face, attendance: None } if face.identifier == "fay"
	));
}

#[tokio::test]
async fn stored_dimension_mismatch_is_a_hard_error() {
	let (service, _, store) =
		service(ScriptedExtractor::default().with_face(b"query", vec![0.0; DIM]));

	store.seed("legacy", vec![0.0; DIM + 1]);

	let err = service.face_match(match_req("query.png", b"query")).await.expect_err("expected error");

	assert!(matches!(err, Error::DimensionMismatch { .. }));
	assert!(store.attendance().is_empty());
}

#[tokio::test]
async fn stored_identifiers_with_extensions_are_stripped_on_match() {
	let (service, _, store) =
		service(ScriptedExtractor::default().with_face(b"query", vec![0.0; DIM]));

	store.seed("gwen.png", vec![0.0; DIM]);

	let face = service
		.match_face("query.png", b"query", 0.6)
		.await
		.expect("match")
		.expect("Expected a match.");

	assert_eq!(face.identifier, "gwen");
}

#[test]
fn invalid_offset_fails_construction() {
	let mut cfg = test_config();

	cfg.attendance.utc_offset = "IST".to_string();

	let store = Arc::new(MemoryStore::default());
	let result = AttendService::with_parts(
		cfg,
		Providers::new(Arc::new(ScriptedExtractor::default())),
		Stores::new(store.clone(), store),
	);

	assert!(matches!(result, Err(Error::Config { .. })));
}
