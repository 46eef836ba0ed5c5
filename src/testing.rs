//! Testing utilities.
//!
//! [`FakeBackend`] is an in-memory implementation of [`Backend`] emulating
//! the Zentral REST collections: integer or UUID key assignment, enrollment
//! secret synthesis with a version counter, and write-only field redaction.
//! [`ProviderTester`] wraps a [`ProviderService`] and drives it the way the
//! runtime would, without any transport.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use serde_json::{json, Value};

use crate::client::{Backend, ZentralClient};
use crate::error::{ClientError, ProviderError};
use crate::provider::ProviderService;
use crate::schema::{Diagnostic, DiagnosticSeverity, ProviderSchema};
use crate::types::{ImportedResource, PlanResult};

/// A recorded backend call, for asserting on what went over the wire.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedRequest {
    /// HTTP method name.
    pub method: String,
    /// Collection path.
    pub collection: String,
    /// Object id, empty for create.
    pub id: String,
    /// Request body, `Null` for get/delete.
    pub body: Value,
}

#[derive(Default)]
struct FakeState {
    objects: HashMap<String, HashMap<String, Value>>,
    next_id: i64,
    requests: Vec<RecordedRequest>,
}

/// In-memory stand-in for the Zentral API.
pub struct FakeBackend {
    state: Mutex<FakeState>,
    uuid_collections: HashSet<&'static str>,
    /// Dotted paths blanked in every response, emulating write-only fields.
    redacted: Vec<(&'static str, &'static str)>,
}

impl FakeBackend {
    /// A fake with the real API's key kinds and write-only fields.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(FakeState {
                next_id: 1,
                ..Default::default()
            }),
            uuid_collections: HashSet::from(["mdm/artifacts"]),
            redacted: vec![("monolith/repositories", "s3_kwargs.cloudfront_privkey_pem")],
        }
    }

    /// Wrap this fake in a client handle.
    pub fn into_client(self) -> ZentralClient {
        ZentralClient::new(std::sync::Arc::new(self))
    }

    /// The calls recorded so far, oldest first.
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.lock().unwrap().requests.clone()
    }

    /// Number of objects stored in a collection.
    pub fn len(&self, collection: &str) -> usize {
        self.state
            .lock()
            .unwrap()
            .objects
            .get(collection)
            .map_or(0, HashMap::len)
    }

    /// True if the collection is empty.
    pub fn is_empty(&self, collection: &str) -> bool {
        self.len(collection) == 0
    }

    fn record(state: &mut FakeState, method: &str, collection: &str, id: &str, body: &Value) {
        state.requests.push(RecordedRequest {
            method: method.to_string(),
            collection: collection.to_string(),
            id: id.to_string(),
            body: body.clone(),
        });
    }

    /// Emulate the server-side fields the real API fills in.
    fn synthesize(collection: &str, object: &mut Value, is_create: bool) {
        let Some(map) = object.as_object_mut() else {
            return;
        };
        if collection == "inventory/tags" {
            let missing = map.get("color").map(Value::is_null).unwrap_or(true);
            if missing {
                map.insert("color".to_string(), json!("0079bf"));
            }
        }
        if let Some(secret) = map.get_mut("secret").and_then(Value::as_object_mut) {
            if !secret.contains_key("secret") {
                secret.insert("secret".to_string(), json!("fake-enrollment-secret"));
            }
            // The version counter bumps on every enrollment update.
            let version = map.get("version").and_then(Value::as_i64).unwrap_or(0);
            map.insert(
                "version".to_string(),
                json!(if is_create { 1 } else { version + 1 }),
            );
        }
    }

    fn redact(&self, collection: &str, object: &mut Value) {
        for (redacted_collection, path) in &self.redacted {
            if *redacted_collection != collection {
                continue;
            }
            let pointer = format!("/{}", path.replace('.', "/"));
            if let Some(slot) = object.pointer_mut(&pointer) {
                *slot = json!("");
            }
        }
    }

    fn respond(&self, collection: &str, object: &Value) -> Value {
        let mut response = object.clone();
        self.redact(collection, &mut response);
        response
    }
}

impl Default for FakeBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl Backend for FakeBackend {
    async fn create(&self, collection: &str, body: Value) -> Result<Value, ClientError> {
        let mut state = self.state.lock().unwrap();
        Self::record(&mut state, "POST", collection, "", &body);

        let id = if self.uuid_collections.contains(collection) {
            json!(uuid::Uuid::new_v4().to_string())
        } else {
            let id = state.next_id;
            state.next_id += 1;
            json!(id)
        };
        let mut object = body;
        if let Some(map) = object.as_object_mut() {
            map.insert("id".to_string(), id.clone());
        }
        Self::synthesize(collection, &mut object, true);

        let key = match &id {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        state
            .objects
            .entry(collection.to_string())
            .or_default()
            .insert(key, object.clone());
        drop(state);
        Ok(self.respond(collection, &object))
    }

    async fn get_by_id(&self, collection: &str, id: &str) -> Result<Value, ClientError> {
        let mut state = self.state.lock().unwrap();
        Self::record(&mut state, "GET", collection, id, &Value::Null);
        let object = state
            .objects
            .get(collection)
            .and_then(|c| c.get(id))
            .cloned()
            .ok_or_else(|| ClientError::Status {
                status: 404,
                body: json!({"detail": "Not found."}).to_string(),
            })?;
        drop(state);
        Ok(self.respond(collection, &object))
    }

    async fn update(&self, collection: &str, id: &str, body: Value) -> Result<Value, ClientError> {
        let mut state = self.state.lock().unwrap();
        Self::record(&mut state, "PUT", collection, id, &body);
        let existing = state
            .objects
            .get(collection)
            .and_then(|c| c.get(id))
            .cloned()
            .ok_or_else(|| ClientError::Status {
                status: 404,
                body: json!({"detail": "Not found."}).to_string(),
            })?;

        let mut object = body;
        if let Some(map) = object.as_object_mut() {
            map.insert("id".to_string(), existing["id"].clone());
            // Carry the version counter forward so the bump is observable.
            if let Some(version) = existing.get("version") {
                map.insert("version".to_string(), version.clone());
            }
        }
        Self::synthesize(collection, &mut object, false);

        if let Some(objects) = state.objects.get_mut(collection) {
            objects.insert(id.to_string(), object.clone());
        }
        drop(state);
        Ok(self.respond(collection, &object))
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<(), ClientError> {
        let mut state = self.state.lock().unwrap();
        Self::record(&mut state, "DELETE", collection, id, &Value::Null);
        let removed = state
            .objects
            .get_mut(collection)
            .and_then(|c| c.remove(id));
        if removed.is_none() {
            return Err(ClientError::Status {
                status: 404,
                body: json!({"detail": "Not found."}).to_string(),
            });
        }
        Ok(())
    }
}

/// A test harness driving a [`ProviderService`] without a transport.
pub struct ProviderTester<P: ProviderService> {
    provider: P,
}

impl<P: ProviderService> ProviderTester<P> {
    /// Create a new tester for the given provider.
    pub fn new(provider: P) -> Self {
        Self { provider }
    }

    /// Get a reference to the underlying provider.
    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Get the provider's schema.
    pub fn schema(&self) -> ProviderSchema {
        self.provider.schema()
    }

    /// Get the list of resource type names.
    pub fn resource_types(&self) -> Vec<String> {
        self.provider.metadata().resources
    }

    /// Configure the provider, failing on error diagnostics.
    pub async fn configure(&self, config: Value) -> Result<(), TestError> {
        let diagnostics = self.provider.configure(config).await?;
        check_diagnostics(diagnostics)
    }

    /// Validate a resource configuration, failing on error diagnostics.
    pub async fn validate_resource_config(
        &self,
        resource_type: &str,
        config: Value,
    ) -> Result<(), TestError> {
        let diagnostics = self
            .provider
            .validate_resource_config(resource_type, config)
            .await?;
        check_diagnostics(diagnostics)
    }

    /// Plan a resource creation (no prior state).
    pub async fn plan_create(
        &self,
        resource_type: &str,
        config: Value,
    ) -> Result<PlanResult, ProviderError> {
        self.provider
            .plan(resource_type, None, config.clone(), config)
            .await
    }

    /// Plan a resource update.
    pub async fn plan_update(
        &self,
        resource_type: &str,
        prior_state: Value,
        config: Value,
    ) -> Result<PlanResult, ProviderError> {
        self.provider
            .plan(resource_type, Some(prior_state), config.clone(), config)
            .await
    }

    /// Create a new resource from a planned state.
    pub async fn create(
        &self,
        resource_type: &str,
        planned_state: Value,
    ) -> Result<Value, ProviderError> {
        self.provider.create(resource_type, planned_state).await
    }

    /// Read the current state of a resource.
    pub async fn read(
        &self,
        resource_type: &str,
        current_state: Value,
    ) -> Result<Value, ProviderError> {
        self.provider.read(resource_type, current_state).await
    }

    /// Update an existing resource.
    pub async fn update(
        &self,
        resource_type: &str,
        prior_state: Value,
        planned_state: Value,
    ) -> Result<Value, ProviderError> {
        self.provider
            .update(resource_type, prior_state, planned_state)
            .await
    }

    /// Delete a resource.
    pub async fn delete(
        &self,
        resource_type: &str,
        current_state: Value,
    ) -> Result<(), ProviderError> {
        self.provider.delete(resource_type, current_state).await
    }

    /// Import an existing resource.
    pub async fn import_resource(
        &self,
        resource_type: &str,
        id: &str,
    ) -> Result<Vec<ImportedResource>, ProviderError> {
        self.provider.import_resource(resource_type, id).await
    }

    /// Read data from a data source.
    pub async fn read_data_source(
        &self,
        data_source_type: &str,
        config: Value,
    ) -> Result<Value, ProviderError> {
        self.provider
            .read_data_source(data_source_type, config)
            .await
    }

    /// Run a full create lifecycle: plan, create, read.
    ///
    /// Returns the final state after read.
    pub async fn lifecycle_create(
        &self,
        resource_type: &str,
        config: Value,
    ) -> Result<Value, ProviderError> {
        let plan_result = self.plan_create(resource_type, config).await?;
        let created_state = self
            .create(resource_type, plan_result.planned_state)
            .await?;
        self.read(resource_type, created_state).await
    }

    /// Run a full update lifecycle: plan, update, read.
    ///
    /// Returns the final state after read.
    pub async fn lifecycle_update(
        &self,
        resource_type: &str,
        prior_state: Value,
        config: Value,
    ) -> Result<Value, ProviderError> {
        let plan_result = self
            .plan_update(resource_type, prior_state.clone(), config)
            .await?;
        let updated_state = self
            .update(resource_type, prior_state, plan_result.planned_state)
            .await?;
        self.read(resource_type, updated_state).await
    }
}

/// Error type for test operations that may fail with diagnostics.
#[derive(Debug)]
pub enum TestError {
    /// The operation failed with diagnostics.
    Diagnostics(Vec<Diagnostic>),
    /// The operation failed with a provider error.
    Provider(ProviderError),
}

impl std::fmt::Display for TestError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TestError::Diagnostics(diags) => {
                writeln!(f, "Operation failed with {} diagnostic(s):", diags.len())?;
                for diag in diags {
                    write!(f, "  [{:?}] {}", diag.severity, diag.summary)?;
                    if let Some(detail) = &diag.detail {
                        write!(f, ": {}", detail)?;
                    }
                    if let Some(attr) = &diag.attribute {
                        write!(f, " (at {})", attr)?;
                    }
                    writeln!(f)?;
                }
                Ok(())
            }
            TestError::Provider(e) => write!(f, "Provider error: {}", e),
        }
    }
}

impl std::error::Error for TestError {}

impl From<ProviderError> for TestError {
    fn from(e: ProviderError) -> Self {
        TestError::Provider(e)
    }
}

/// Check diagnostics and return an error if there are any errors.
fn check_diagnostics(diagnostics: Vec<Diagnostic>) -> Result<(), TestError> {
    let errors: Vec<_> = diagnostics
        .into_iter()
        .filter(|d| matches!(d.severity, DiagnosticSeverity::Error))
        .collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(TestError::Diagnostics(errors))
    }
}

/// Assert that a plan result indicates no changes.
///
/// # Panics
///
/// Panics if the plan has any changes.
pub fn assert_plan_no_changes(plan: &PlanResult) {
    assert!(
        plan.changes.is_empty(),
        "Expected no changes, but got {} change(s): {:?}",
        plan.changes.len(),
        plan.changes.iter().map(|c| &c.path).collect::<Vec<_>>()
    );
}

/// Assert that a plan has a change for a specific attribute path.
///
/// # Panics
///
/// Panics if the plan does not have a change for the given path.
pub fn assert_plan_changes_attribute(plan: &PlanResult, path: &str) {
    let has_change = plan.changes.iter().any(|c| c.path == path);
    assert!(
        has_change,
        "Expected plan to change attribute '{}', but it was not changed. Changed attributes: {:?}",
        path,
        plan.changes.iter().map(|c| &c.path).collect::<Vec<_>>()
    );
}

/// Assert that a plan does not have a change for a specific attribute path.
///
/// # Panics
///
/// Panics if the plan has a change for the given path.
pub fn assert_plan_does_not_change_attribute(plan: &PlanResult, path: &str) {
    let has_change = plan.changes.iter().any(|c| c.path == path);
    assert!(
        !has_change,
        "Expected plan to not change attribute '{}', but it was changed",
        path
    );
}

/// Assert that diagnostics contain no errors.
///
/// # Panics
///
/// Panics if there are any error diagnostics.
pub fn assert_no_errors(diagnostics: &[Diagnostic]) {
    let errors: Vec<_> = diagnostics
        .iter()
        .filter(|d| matches!(d.severity, DiagnosticSeverity::Error))
        .collect();

    assert!(
        errors.is_empty(),
        "Expected no errors, but got {} error(s): {:?}",
        errors.len(),
        errors.iter().map(|d| &d.summary).collect::<Vec<_>>()
    );
}

/// Assert that diagnostics contain an error with the given summary substring.
///
/// # Panics
///
/// Panics if no error diagnostic contains the given substring.
pub fn assert_error_contains(diagnostics: &[Diagnostic], substring: &str) {
    let has_matching_error = diagnostics
        .iter()
        .any(|d| matches!(d.severity, DiagnosticSeverity::Error) && d.summary.contains(substring));

    assert!(
        has_matching_error,
        "Expected an error containing '{}', but no matching error found. Errors: {:?}",
        substring,
        diagnostics
            .iter()
            .filter(|d| matches!(d.severity, DiagnosticSeverity::Error))
            .map(|d| &d.summary)
            .collect::<Vec<_>>()
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_fake_backend_integer_keys() {
        let backend = FakeBackend::new();
        let created = backend
            .create("inventory/taxonomies", json!({"name": "Desks"}))
            .await
            .unwrap();
        assert_eq!(created["id"], 1);

        let fetched = backend.get_by_id("inventory/taxonomies", "1").await.unwrap();
        assert_eq!(fetched["name"], "Desks");

        backend.delete("inventory/taxonomies", "1").await.unwrap();
        assert!(backend.is_empty("inventory/taxonomies"));
    }

    #[tokio::test]
    async fn test_fake_backend_uuid_keys() {
        let backend = FakeBackend::new();
        let created = backend
            .create("mdm/artifacts", json!({"name": "Base"}))
            .await
            .unwrap();
        let id = created["id"].as_str().unwrap().to_string();
        assert!(uuid::Uuid::parse_str(&id).is_ok());

        let fetched = backend.get_by_id("mdm/artifacts", &id).await.unwrap();
        assert_eq!(fetched["name"], "Base");
    }

    #[tokio::test]
    async fn test_fake_backend_missing_object_is_404() {
        let backend = FakeBackend::new();
        let err = backend
            .get_by_id("inventory/tags", "999")
            .await
            .unwrap_err();
        assert_eq!(err.status(), Some(404));
    }

    #[tokio::test]
    async fn test_fake_backend_assigns_tag_color() {
        let backend = FakeBackend::new();
        let created = backend
            .create("inventory/tags", json!({"name": "server", "color": null}))
            .await
            .unwrap();
        assert_eq!(created["color"], "0079bf");
    }

    #[tokio::test]
    async fn test_fake_backend_enrollment_secret_and_version() {
        let backend = FakeBackend::new();
        let created = backend
            .create(
                "santa/enrollments",
                json!({"configuration": 1, "secret": {"meta_business_unit": 2, "tags": []}}),
            )
            .await
            .unwrap();
        assert_eq!(created["version"], 1);
        assert_eq!(created["secret"]["secret"], "fake-enrollment-secret");

        let updated = backend
            .update(
                "santa/enrollments",
                "1",
                json!({"configuration": 1, "secret": {"meta_business_unit": 2, "tags": [3]}}),
            )
            .await
            .unwrap();
        assert_eq!(updated["version"], 2);
    }

    #[tokio::test]
    async fn test_fake_backend_redacts_cloudfront_key() {
        let backend = FakeBackend::new();
        let created = backend
            .create(
                "monolith/repositories",
                json!({
                    "name": "munki",
                    "backend": "S3",
                    "s3_kwargs": {"bucket": "b", "cloudfront_privkey_pem": "PRIVATE"}
                }),
            )
            .await
            .unwrap();
        assert_eq!(created["s3_kwargs"]["cloudfront_privkey_pem"], "");
        // The stored object keeps the value; only responses are redacted.
        let fetched = backend
            .get_by_id("monolith/repositories", "1")
            .await
            .unwrap();
        assert_eq!(fetched["s3_kwargs"]["cloudfront_privkey_pem"], "");
    }

    #[tokio::test]
    async fn test_fake_backend_redaction_skips_absent_blocks() {
        let backend = FakeBackend::new();
        let created = backend
            .create(
                "monolith/repositories",
                json!({"name": "munki", "backend": "VIRTUAL"}),
            )
            .await
            .unwrap();
        // No s3_kwargs block means nothing to blank; the object is untouched.
        assert!(created.get("s3_kwargs").is_none());
        assert_eq!(created["name"], "munki");
    }

    #[tokio::test]
    async fn test_fake_backend_records_requests() {
        let backend = FakeBackend::new();
        backend
            .create("inventory/taxonomies", json!({"name": "Desks"}))
            .await
            .unwrap();
        backend.get_by_id("inventory/taxonomies", "1").await.unwrap();

        let requests = backend.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].method, "POST");
        assert_eq!(requests[1].method, "GET");
        assert_eq!(requests[1].id, "1");
    }
}
