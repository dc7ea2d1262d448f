//! Tests for the session driver: loading, retries, lookups, probes,
//! drafts, and submission.
mod common;
use async_trait::async_trait;
use caseflow::prelude::*;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

struct FakeApi {
    schema: serde_json::Value,
    authenticated: AtomicBool,
    /// Number of initial schema fetches that fail with a network error.
    fail_first: AtomicUsize,
    /// A non-transient error returned by every schema fetch, when set.
    hard_fail: Mutex<Option<ApiError>>,
    fetches: AtomicUsize,
    lookup_calls: AtomicUsize,
    submit_fails: AtomicBool,
    submitted: Mutex<Vec<CaseSubmission>>,
    drafts: Mutex<Vec<CaseSubmission>>,
}

impl FakeApi {
    fn new(schema: serde_json::Value) -> Arc<Self> {
        Arc::new(Self {
            schema,
            authenticated: AtomicBool::new(true),
            fail_first: AtomicUsize::new(0),
            hard_fail: Mutex::new(None),
            fetches: AtomicUsize::new(0),
            lookup_calls: AtomicUsize::new(0),
            submit_fails: AtomicBool::new(false),
            submitted: Mutex::new(Vec::new()),
            drafts: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl PortalApi for FakeApi {
    async fn fetch_flow_schema(&self, _service_code: &str) -> Result<FlowResponse, ApiError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = self.hard_fail.lock().unwrap().clone() {
            return Err(err);
        }
        if self
            .fail_first
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
        {
            return Err(ApiError::Network("connection reset".to_string()));
        }
        serde_json::from_value(self.schema.clone()).map_err(|e| ApiError::Decode(e.to_string()))
    }

    async fn fetch_lookup_options(
        &self,
        lookup: LookupId,
    ) -> Result<Vec<LookupOption>, ApiError> {
        self.lookup_calls.fetch_add(1, Ordering::SeqCst);
        Ok(vec![LookupOption {
            id: lookup,
            name: format!("Option {}", lookup),
            code: format!("L{}", lookup),
            icon: None,
        }])
    }

    async fn submit_case(&self, case: &CaseSubmission) -> Result<CaseReceipt, ApiError> {
        if self.submit_fails.load(Ordering::SeqCst) {
            return Err(ApiError::Network("gateway timeout".to_string()));
        }
        self.submitted.lock().unwrap().push(case.clone());
        Ok(CaseReceipt {
            case_id: Some(99),
            message: Some("created".to_string()),
        })
    }

    async fn save_draft_case(&self, case: &CaseSubmission) -> Result<CaseReceipt, ApiError> {
        self.drafts.lock().unwrap().push(case.clone());
        Ok(CaseReceipt {
            case_id: Some(7),
            message: None,
        })
    }

    fn is_authenticated(&self) -> bool {
        self.authenticated.load(Ordering::SeqCst)
    }
}

struct FakeProbe {
    dimensions: Result<(u32, u32), ProbeError>,
}

#[async_trait]
impl ImageProbe for FakeProbe {
    async fn dimensions(&self, _blob: &FileBlob) -> Result<(u32, u32), ProbeError> {
        self.dimensions.clone()
    }
}

fn probe_with(dimensions: Result<(u32, u32), ProbeError>) -> Arc<FakeProbe> {
    Arc::new(FakeProbe { dimensions })
}

fn config() -> SessionConfig {
    SessionConfig {
        service_code: "42".to_string(),
        case_type: 42,
        applicant_type: 13,
        file_types: FileTypeCatalog::new("01"),
    }
}

fn session(api: Arc<FakeApi>, probe: Arc<FakeProbe>) -> FlowSession {
    FlowSession::new(api, probe, Arc::new(LookupCache::new()), config())
}

/// One step: a mandatory name plus two choice fields sharing lookup 42.
fn lookup_schema() -> serde_json::Value {
    serde_json::json!({
        "service_flow": [
            {
                "sequence_number": "1",
                "name": "Applicant",
                "page_id": 1,
                "categories": [
                    {
                        "id": 1,
                        "name": "Identity",
                        "fields": [
                            {
                                "name": "full_name",
                                "field_id": 1,
                                "display_name": "Full name",
                                "field_type": "text",
                                "mandatory": true
                            },
                            {
                                "name": "nationality",
                                "field_id": 2,
                                "display_name": "Nationality",
                                "field_type": "choice",
                                "lookup": 42,
                                "max_selections": 1
                            },
                            {
                                "name": "residence",
                                "field_id": 3,
                                "display_name": "Residence",
                                "field_type": "choice",
                                "lookup": 42,
                                "max_selections": 1
                            },
                            {
                                "name": "gender",
                                "field_id": 4,
                                "display_name": "Gender",
                                "field_type": "choice",
                                "max_selections": 1,
                                "allowed_lookups": [
                                    { "name": "Female", "id": 1, "code": "F", "icon": null },
                                    { "name": "Male", "id": 2, "code": "M", "icon": null }
                                ]
                            }
                        ]
                    }
                ]
            }
        ]
    })
}

/// One step holding a single image upload with a width cap.
fn photo_schema() -> serde_json::Value {
    serde_json::json!({
        "service_flow": [
            {
                "sequence_number": "1",
                "name": "Documents",
                "page_id": 1,
                "categories": [
                    {
                        "id": 1,
                        "name": "Uploads",
                        "fields": [
                            {
                                "name": "photo",
                                "field_id": 1,
                                "display_name": "Photo",
                                "field_type": "file",
                                "image_max_width": 800
                            }
                        ]
                    }
                ]
            }
        ]
    })
}

#[tokio::test]
async fn test_load_builds_wizard_and_prefetches_lookups_once() {
    let api = FakeApi::new(lookup_schema());
    let mut session = session(api.clone(), probe_with(Ok((1, 1))));

    session.load().await.unwrap();
    assert!(session.is_ready());
    assert_eq!(session.wizard().unwrap().total_steps(), 1);

    // Two fields share lookup 42: one fetch, one cache entry.
    assert_eq!(api.lookup_calls.load(Ordering::SeqCst), 1);
    assert_eq!(session.options_for("nationality").len(), 1);
    assert_eq!(session.options_for("residence").len(), 1);

    // Inline options win over the cache and never hit the backend.
    let genders = session.options_for("gender");
    assert_eq!(genders.len(), 2);
    assert_eq!(genders[0].code, "F");
}

#[tokio::test]
async fn test_load_retries_transient_failures() {
    let api = FakeApi::new(lookup_schema());
    api.fail_first.store(2, Ordering::SeqCst);
    let mut session = session(api.clone(), probe_with(Ok((1, 1))));

    session.load().await.unwrap();
    assert!(session.is_ready());
    assert_eq!(api.fetches.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_load_gives_up_after_two_retries() {
    let api = FakeApi::new(lookup_schema());
    api.fail_first.store(5, Ordering::SeqCst);
    let mut session = session(api.clone(), probe_with(Ok((1, 1))));

    let err = session.load().await.unwrap_err();
    assert!(matches!(err, FlowError::Api(ApiError::Network(_))));
    assert_eq!(api.fetches.load(Ordering::SeqCst), 3);
    assert!(!session.is_ready());
    assert!(session.last_error().is_some());
}

#[tokio::test]
async fn test_non_transient_failures_do_not_retry() {
    let api = FakeApi::new(lookup_schema());
    *api.hard_fail.lock().unwrap() = Some(ApiError::Status { status: 404 });
    let mut session = session(api.clone(), probe_with(Ok((1, 1))));

    let err = session.load().await.unwrap_err();
    assert!(matches!(err, FlowError::Api(ApiError::Status { status: 404 })));
    assert_eq!(api.fetches.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_unauthenticated_load_is_rejected() {
    let api = FakeApi::new(lookup_schema());
    api.authenticated.store(false, Ordering::SeqCst);
    let mut session = session(api.clone(), probe_with(Ok((1, 1))));

    let err = session.load().await.unwrap_err();
    assert!(matches!(err, FlowError::Api(ApiError::Unauthorized)));
    assert_eq!(api.fetches.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_malformed_schema_surfaces_as_schema_error() {
    let api = FakeApi::new(serde_json::json!({
        "service_flow": [
            { "sequence_number": "later", "name": "A", "page_id": 1, "categories": [] }
        ]
    }));
    let mut session = session(api, probe_with(Ok((1, 1))));

    let err = session.load().await.unwrap_err();
    assert!(matches!(err, FlowError::Schema(SchemaError::InvalidSequenceNumber { .. })));
    assert!(session.last_error().is_some());
}

#[tokio::test]
async fn test_save_draft_collects_values_without_validating() {
    let api = FakeApi::new(lookup_schema());
    let mut session = session(api.clone(), probe_with(Ok((1, 1))));
    session.load().await.unwrap();

    // The mandatory field is still empty; drafts do not care.
    let nationality = option_value(&session.options_for("nationality")[0]);
    session.set_value("nationality", nationality).unwrap();
    let receipt = session.save_draft().await.unwrap();
    assert_eq!(receipt.case_id, Some(7));

    let drafts = api.drafts.lock().unwrap();
    assert_eq!(drafts.len(), 1);
    // The fake lookup's option ids mirror the lookup id.
    assert_eq!(
        drafts[0].case_data.get("nationality"),
        Some(&CaseValue::Data(Value::Number(42.0)))
    );
    // The step index did not move.
    drop(drafts);
    assert_eq!(session.wizard().unwrap().current_index(), 0);
}

#[tokio::test]
async fn test_submission_failure_preserves_state_for_retry() {
    let api = FakeApi::new(lookup_schema());
    let mut session = session(api.clone(), probe_with(Ok((1, 1))));
    session.load().await.unwrap();

    session.set_value("full_name", "Jane Doe").unwrap();
    api.submit_fails.store(true, Ordering::SeqCst);

    let err = session.next().await.unwrap_err();
    assert!(matches!(err, FlowError::Submission(_)));

    // Everything survives: the user retries without re-entering data.
    assert!(session.is_ready());
    assert_eq!(
        *session.wizard().unwrap().current_step().value("full_name"),
        Value::Text("Jane Doe".into())
    );

    api.submit_fails.store(false, Ordering::SeqCst);
    match session.next().await.unwrap() {
        SessionAdvance::Submitted(receipt) => assert_eq!(receipt.case_id, Some(99)),
        other => panic!("expected submission, got {:?}", other),
    }

    // A submitted flow is finished; its state is dropped.
    assert!(!session.is_ready());
    assert_eq!(api.submitted.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_blocked_step_reports_errors_instead_of_submitting() {
    let api = FakeApi::new(lookup_schema());
    let mut session = session(api.clone(), probe_with(Ok((1, 1))));
    session.load().await.unwrap();

    match session.next().await.unwrap() {
        SessionAdvance::Blocked { errors, .. } => {
            assert_eq!(errors[0].code(), "required");
        }
        other => panic!("expected blocked, got {:?}", other),
    }
    assert!(api.submitted.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_next_settles_image_probes_before_advancing() {
    let api = FakeApi::new(photo_schema());
    let mut session = session(api.clone(), probe_with(Ok((640, 480))));
    session.load().await.unwrap();

    session
        .set_file("photo", FileBlob::new("p.png", "image/png", vec![0; 32]))
        .unwrap();

    match session.next().await.unwrap() {
        SessionAdvance::Submitted(_) => {}
        other => panic!("expected submission, got {:?}", other),
    }

    let submitted = api.submitted.lock().unwrap();
    assert!(submitted[0].has_attachments());
    assert_eq!(submitted[0].file_types, vec!["01".to_string()]);
}

#[tokio::test]
async fn test_oversized_image_blocks_after_settling() {
    let api = FakeApi::new(photo_schema());
    let mut session = session(api.clone(), probe_with(Ok((2000, 100))));
    session.load().await.unwrap();

    session
        .set_file("photo", FileBlob::new("p.png", "image/png", vec![0; 32]))
        .unwrap();

    match session.next().await.unwrap() {
        SessionAdvance::Blocked { errors, pending } => {
            assert!(pending.is_empty());
            assert_eq!(errors[0].code(), "imageDimensions");
        }
        other => panic!("expected blocked, got {:?}", other),
    }
}

#[tokio::test]
async fn test_undecodable_image_waives_dimension_limits() {
    let api = FakeApi::new(photo_schema());
    let mut session = session(
        api.clone(),
        probe_with(Err(ProbeError::Decode("not an image".to_string()))),
    );
    session.load().await.unwrap();

    session
        .set_file("photo", FileBlob::new("p.png", "image/png", vec![0; 32]))
        .unwrap();

    assert!(matches!(
        session.next().await.unwrap(),
        SessionAdvance::Submitted(_)
    ));
}

#[tokio::test]
async fn test_abandon_drops_all_state() {
    let api = FakeApi::new(lookup_schema());
    let mut session = session(api, probe_with(Ok((1, 1))));
    session.load().await.unwrap();

    session.abandon();
    assert!(!session.is_ready());
    assert!(matches!(
        session.set_value("full_name", "x").unwrap_err(),
        FlowError::NotReady
    ));
    assert!(matches!(session.save_draft().await.unwrap_err(), FlowError::NotReady));
}

#[tokio::test]
async fn test_lookup_cache_is_shared_across_sessions() {
    let api = FakeApi::new(lookup_schema());
    let cache = Arc::new(LookupCache::new());

    let mut first = FlowSession::new(api.clone(), probe_with(Ok((1, 1))), cache.clone(), config());
    first.load().await.unwrap();
    let mut second = FlowSession::new(api.clone(), probe_with(Ok((1, 1))), cache, config());
    second.load().await.unwrap();

    // Populate-once: the second session reuses the first session's entry.
    assert_eq!(api.lookup_calls.load(Ordering::SeqCst), 1);
}
