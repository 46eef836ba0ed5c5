//! Provider service trait and the Zentral registry.
//!
//! [`ProviderService`] is the operation surface the runtime drives: schema
//! discovery, configure, validate, plan, the CRUD operations, import and
//! data source reads. [`ZentralProvider`] implements it by dispatching on
//! the `zentral_<kind>` type name to the matching resource adapter.
//!
//! Configure builds the shared HTTP client exactly once; every call before
//! a successful configure fails with a configuration error.

use std::collections::HashMap;
use std::sync::OnceLock;

use serde_json::Value;
use tracing::{debug, error, info, instrument, warn};

use crate::client::{ClientConfig, ZentralClient};
use crate::error::ProviderError;
use crate::plan::plan_resource;
use crate::resources::{all_data_sources, all_resources, DataSourceAdapter, ResourceAdapter};
use crate::schema::{Attribute, Diagnostic, DiagnosticSeverity, ProviderSchema, Schema};
use crate::types::{ImportedResource, PlanResult, ProviderMetadata};
use crate::validation::validate;

/// Trait that provider implementations must implement.
///
/// This is the transport-agnostic surface: the runtime embedding layer
/// drives it with plain JSON values, and the [`crate::testing`] harness
/// drives it directly in tests.
#[async_trait::async_trait]
pub trait ProviderService: Send + Sync + 'static {
    /// Return the provider's schema including all resources and data sources.
    fn schema(&self) -> ProviderSchema;

    /// Return provider metadata for discovery.
    /// By default, this is derived from the schema.
    fn metadata(&self) -> ProviderMetadata {
        let schema = self.schema();
        ProviderMetadata {
            resources: schema.resources.keys().cloned().collect(),
            data_sources: schema.data_sources.keys().cloned().collect(),
            capabilities: Default::default(),
        }
    }

    /// Validate the provider configuration before configuring.
    /// Returns diagnostics (errors and warnings).
    async fn validate_provider_config(
        &self,
        config: Value,
    ) -> Result<Vec<Diagnostic>, ProviderError> {
        let _ = config;
        Ok(vec![])
    }

    /// Configure the provider with credentials and settings.
    /// Returns diagnostics (errors and warnings).
    async fn configure(&self, config: Value) -> Result<Vec<Diagnostic>, ProviderError>;

    /// Stop the provider gracefully.
    async fn stop(&self) -> Result<(), ProviderError> {
        Ok(())
    }

    /// Validate a resource's configuration before planning.
    async fn validate_resource_config(
        &self,
        resource_type: &str,
        config: Value,
    ) -> Result<Vec<Diagnostic>, ProviderError> {
        let _ = (resource_type, config);
        Ok(vec![])
    }

    /// Upgrade resource state from an older schema version.
    async fn upgrade_resource_state(
        &self,
        resource_type: &str,
        version: i64,
        state: Value,
    ) -> Result<Value, ProviderError> {
        let _ = (resource_type, version);
        // Default: no upgrade needed, return state as-is
        Ok(state)
    }

    /// Plan changes for a resource.
    async fn plan(
        &self,
        resource_type: &str,
        prior_state: Option<Value>,
        proposed_state: Value,
        config: Value,
    ) -> Result<PlanResult, ProviderError>;

    /// Create a new resource.
    async fn create(&self, resource_type: &str, planned_state: Value)
        -> Result<Value, ProviderError>;

    /// Read the current state of a resource.
    async fn read(&self, resource_type: &str, current_state: Value)
        -> Result<Value, ProviderError>;

    /// Update an existing resource.
    async fn update(
        &self,
        resource_type: &str,
        prior_state: Value,
        planned_state: Value,
    ) -> Result<Value, ProviderError>;

    /// Delete a resource.
    async fn delete(&self, resource_type: &str, current_state: Value) -> Result<(), ProviderError>;

    /// Import existing objects into management.
    async fn import_resource(
        &self,
        resource_type: &str,
        _id: &str,
    ) -> Result<Vec<ImportedResource>, ProviderError> {
        Err(ProviderError::UnknownResource(format!(
            "Import not supported for resource type: {}",
            resource_type
        )))
    }

    /// Validate a data source's configuration.
    async fn validate_data_source_config(
        &self,
        data_source_type: &str,
        config: Value,
    ) -> Result<Vec<Diagnostic>, ProviderError> {
        let _ = (data_source_type, config);
        Ok(vec![])
    }

    /// Read data from an external source.
    async fn read_data_source(
        &self,
        data_source_type: &str,
        _config: Value,
    ) -> Result<Value, ProviderError> {
        Err(ProviderError::UnknownResource(format!(
            "Unknown data source type: {}",
            data_source_type
        )))
    }
}

/// The Zentral provider: the full kind registry plus the shared client.
pub struct ZentralProvider {
    client: OnceLock<ZentralClient>,
    resources: HashMap<String, Box<dyn ResourceAdapter>>,
    data_sources: HashMap<String, Box<dyn DataSourceAdapter>>,
}

impl ZentralProvider {
    /// Build the provider with every registered kind.
    pub fn new() -> Self {
        let resources = all_resources()
            .into_iter()
            .map(|adapter| (format!("zentral_{}", adapter.kind()), adapter))
            .collect();
        let data_sources = all_data_sources()
            .into_iter()
            .map(|adapter| (format!("zentral_{}", adapter.kind()), adapter))
            .collect();
        Self {
            client: OnceLock::new(),
            resources,
            data_sources,
        }
    }

    /// Build a pre-configured provider around an existing client. Used by
    /// tests to skip configure and inject a fake backend.
    pub fn with_client(client: ZentralClient) -> Self {
        let provider = Self::new();
        let _ = provider.client.set(client);
        provider
    }

    /// The provider configuration block.
    ///
    /// Every attribute is optional: unset values fall back to the
    /// `ZTL_API_*` environment variables at configure time.
    pub fn config_schema() -> Schema {
        Schema::v0()
            .with_attribute("base_url", Attribute::optional_string())
            .with_attribute("token", Attribute::optional_string().sensitive())
            .with_attribute("ca_certificate", Attribute::optional_string())
            .with_attribute("tls_skip_verify", Attribute::optional_bool())
    }

    fn client(&self) -> Result<&ZentralClient, ProviderError> {
        self.client
            .get()
            .ok_or_else(|| ProviderError::Configuration("provider is not configured".to_string()))
    }

    fn resource(&self, resource_type: &str) -> Result<&dyn ResourceAdapter, ProviderError> {
        self.resources
            .get(resource_type)
            .map(AsRef::as_ref)
            .ok_or_else(|| ProviderError::UnknownResource(resource_type.to_string()))
    }

    fn data_source(&self, data_source_type: &str) -> Result<&dyn DataSourceAdapter, ProviderError> {
        self.data_sources
            .get(data_source_type)
            .map(AsRef::as_ref)
            .ok_or_else(|| ProviderError::UnknownResource(data_source_type.to_string()))
    }

    fn check_valid(schema: &Schema, config: &Value) -> Result<(), ProviderError> {
        let diagnostics = validate(schema, config);
        let errors: Vec<String> = diagnostics
            .iter()
            .filter(|d| matches!(d.severity, DiagnosticSeverity::Error))
            .map(|d| match (&d.attribute, &d.detail) {
                (Some(attr), Some(detail)) => format!("{}: {} ({})", attr, d.summary, detail),
                (Some(attr), None) => format!("{}: {}", attr, d.summary),
                (None, Some(detail)) => format!("{} ({})", d.summary, detail),
                (None, None) => d.summary.clone(),
            })
            .collect();
        if errors.is_empty() {
            Ok(())
        } else {
            Err(ProviderError::Validation(errors.join("; ")))
        }
    }
}

impl Default for ZentralProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl ProviderService for ZentralProvider {
    fn schema(&self) -> ProviderSchema {
        let mut schema = ProviderSchema::new().with_provider_config(Self::config_schema());
        for (name, adapter) in &self.resources {
            schema = schema.with_resource(name.clone(), adapter.schema());
        }
        for (name, adapter) in &self.data_sources {
            schema = schema.with_data_source(name.clone(), adapter.schema());
        }
        schema
    }

    #[instrument(skip_all)]
    async fn validate_provider_config(
        &self,
        config: Value,
    ) -> Result<Vec<Diagnostic>, ProviderError> {
        Ok(validate(&Self::config_schema(), &config))
    }

    #[instrument(skip_all)]
    async fn configure(&self, config: Value) -> Result<Vec<Diagnostic>, ProviderError> {
        let resolved = match ClientConfig::resolve(&config) {
            Ok(resolved) => resolved,
            Err(message) => {
                warn!(error = %message, "provider configuration incomplete");
                return Ok(vec![Diagnostic::error("Invalid provider configuration")
                    .with_detail(message)]);
            }
        };
        let client = ZentralClient::from_config(&resolved)?;
        if self.client.set(client).is_err() {
            debug!("provider already configured, keeping existing client");
        }
        info!(base_url = %resolved.base_url, "provider configured");
        Ok(vec![])
    }

    #[instrument(skip(self, config))]
    async fn validate_resource_config(
        &self,
        resource_type: &str,
        config: Value,
    ) -> Result<Vec<Diagnostic>, ProviderError> {
        let adapter = self.resource(resource_type)?;
        Ok(validate(&adapter.schema(), &config))
    }

    #[instrument(skip(self, prior_state, proposed_state, config))]
    async fn plan(
        &self,
        resource_type: &str,
        prior_state: Option<Value>,
        proposed_state: Value,
        config: Value,
    ) -> Result<PlanResult, ProviderError> {
        let adapter = self.resource(resource_type)?;
        let schema = adapter.schema();
        let config = if config.is_null() { proposed_state } else { config };
        Self::check_valid(&schema, &config)?;
        let result = plan_resource(&schema, prior_state.as_ref(), &config);
        debug!(
            changes = result.changes.len(),
            requires_replace = result.requires_replace,
            "plan rendered"
        );
        Ok(result)
    }

    #[instrument(skip(self, planned_state))]
    async fn create(
        &self,
        resource_type: &str,
        planned_state: Value,
    ) -> Result<Value, ProviderError> {
        let adapter = self.resource(resource_type)?;
        let state = adapter.create(self.client()?, planned_state).await?;
        info!("resource created");
        Ok(state)
    }

    #[instrument(skip(self, current_state))]
    async fn read(&self, resource_type: &str, current_state: Value) -> Result<Value, ProviderError> {
        let adapter = self.resource(resource_type)?;
        adapter.read(self.client()?, current_state).await
    }

    #[instrument(skip(self, prior_state, planned_state))]
    async fn update(
        &self,
        resource_type: &str,
        prior_state: Value,
        planned_state: Value,
    ) -> Result<Value, ProviderError> {
        let adapter = self.resource(resource_type)?;
        let state = adapter
            .update(self.client()?, prior_state, planned_state)
            .await?;
        info!("resource updated");
        Ok(state)
    }

    #[instrument(skip(self, current_state))]
    async fn delete(&self, resource_type: &str, current_state: Value) -> Result<(), ProviderError> {
        let adapter = self.resource(resource_type)?;
        adapter.delete(self.client()?, current_state).await?;
        info!("resource deleted");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn import_resource(
        &self,
        resource_type: &str,
        id: &str,
    ) -> Result<Vec<ImportedResource>, ProviderError> {
        let adapter = self.resource(resource_type)?;
        let state = adapter.import_state(id).map_err(|diag| {
            error!(summary = %diag.summary, "import id rejected");
            ProviderError::Validation(match diag.detail {
                Some(detail) => format!("{}: {}", diag.summary, detail),
                None => diag.summary,
            })
        })?;
        Ok(vec![ImportedResource::new(resource_type, state)])
    }

    #[instrument(skip(self, config))]
    async fn validate_data_source_config(
        &self,
        data_source_type: &str,
        config: Value,
    ) -> Result<Vec<Diagnostic>, ProviderError> {
        let adapter = self.data_source(data_source_type)?;
        Ok(validate(&adapter.schema(), &config))
    }

    #[instrument(skip(self, config))]
    async fn read_data_source(
        &self,
        data_source_type: &str,
        config: Value,
    ) -> Result<Value, ProviderError> {
        let adapter = self.data_source(data_source_type)?;
        adapter.read(self.client()?, config).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_type_names() {
        let provider = ZentralProvider::new();
        let schema = provider.schema();
        for name in [
            "zentral_taxonomy",
            "zentral_tag",
            "zentral_meta_business_unit",
            "zentral_santa_configuration",
            "zentral_santa_enrollment",
            "zentral_mdm_blueprint",
            "zentral_mdm_artifact",
            "zentral_mdm_blueprint_artifact",
            "zentral_mdm_scep_issuer",
            "zentral_monolith_repository",
        ] {
            assert!(schema.resources.contains_key(name), "missing {}", name);
        }
        // Only lookup-by-id kinds are exposed as data sources.
        assert!(schema.data_sources.contains_key("zentral_tag"));
        assert!(!schema.data_sources.contains_key("zentral_mdm_scep_issuer"));
    }

    #[test]
    fn test_provider_config_schema() {
        let schema = ZentralProvider::config_schema();
        let token = schema.block.attributes.get("token").unwrap();
        assert!(token.flags.sensitive);
        assert!(token.flags.optional);
    }

    #[tokio::test]
    async fn test_operations_require_configure() {
        let provider = ZentralProvider::new();
        let err = provider
            .read("zentral_tag", serde_json::json!({"id": 1}))
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::Configuration(_)));
    }

    #[tokio::test]
    async fn test_unknown_resource_type() {
        let provider = ZentralProvider::new();
        let err = provider
            .plan(
                "zentral_widget",
                None,
                serde_json::json!({}),
                serde_json::json!({}),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::UnknownResource(_)));
    }

    #[tokio::test]
    async fn test_configure_reports_missing_credentials() {
        std::env::remove_var(crate::client::ENV_BASE_URL);
        std::env::remove_var(crate::client::ENV_TOKEN);
        let provider = ZentralProvider::new();
        let diagnostics = provider.configure(serde_json::json!({})).await.unwrap();
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].summary, "Invalid provider configuration");
    }

    #[tokio::test]
    async fn test_plan_rejects_invalid_config() {
        let provider = ZentralProvider::new();
        let err = provider
            .plan(
                "zentral_santa_configuration",
                None,
                Value::Null,
                serde_json::json!({"name": "Default", "batch_size": 1000}),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::Validation(_)));
    }

    #[tokio::test]
    async fn test_import_dispatch() {
        let provider = ZentralProvider::new();
        let imported = provider
            .import_resource("zentral_tag", "42")
            .await
            .unwrap();
        assert_eq!(imported.len(), 1);
        assert_eq!(imported[0].state, serde_json::json!({"id": 42}));

        let err = provider
            .import_resource("zentral_tag", "forty-two")
            .await
            .unwrap_err();
        assert!(format!("{}", err).contains("Zentral tag ID must be an integer"));
    }
}
