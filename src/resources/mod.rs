//! Resource kinds and the uniform CRUD adapter.
//!
//! Every Zentral object type is described by one [`ResourceModel`]
//! implementation: the state-shaped struct (three-valued fields tagged with
//! schema attribute names), its request/response codecs, and its collection
//! binding on the client. [`CollectionAdapter`] then provides the identical
//! lifecycle template for all of them; the only per-kind pieces are the
//! model, the codecs and the identifier parsing rule.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::instrument;

use crate::client::{ResourceId, ZentralClient};
use crate::error::ProviderError;
use crate::schema::{Attribute, AttributeFlags, Diagnostic, Schema};
use crate::value::{decode_model, encode_model};

pub mod blocks;
pub mod mdm_artifact;
pub mod mdm_blueprint;
pub mod mdm_blueprint_artifact;
pub mod mdm_scep_issuer;
pub mod meta_business_unit;
pub mod monolith_repository;
pub mod santa;
pub mod tag;
pub mod taxonomy;

/// Which of the two disjoint identifier kinds a resource uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdKind {
    /// Integer surrogate key assigned by the backend.
    Integer,
    /// Opaque UUID string assigned by the backend.
    Uuid,
}

/// Per-kind description: model struct, codecs, collection binding.
pub trait ResourceModel: Serialize + DeserializeOwned + Send + Sync + 'static {
    /// The kind slug, e.g. `tag`. Type names are `zentral_<KIND>`.
    const KIND: &'static str;
    /// The API collection path, e.g. `inventory/tags`.
    const COLLECTION: &'static str;
    /// The identifier kind.
    const ID_KIND: IdKind;

    /// The backend request payload for create and update.
    type Request: Serialize + Send + Sync;
    /// The backend response payload.
    type Response: DeserializeOwned + Send;

    /// The attribute table for this kind.
    fn schema() -> Schema;

    /// The instance identifier, when known.
    fn id(&self) -> Option<ResourceId>;

    /// Translate the model into a backend request.
    ///
    /// The schema/validator layer guarantees preconditions; failures here
    /// are translation errors (e.g. an inconsistent backend sub-object).
    fn to_request(&self) -> Result<Self::Request, ProviderError>;

    /// Translate a backend response into a model.
    ///
    /// `prior` is the carryover source for attributes the backend does not
    /// echo; by the time this returns every attribute is known or null,
    /// never unknown.
    fn from_response(response: Self::Response, prior: Option<&Self>) -> Self;
}

/// Parse an integer import identifier.
///
/// Every non-integer input produces a diagnostic; every valid integer
/// produces an id and nothing else.
pub fn import_integer_id(kind: &str, raw: &str) -> Result<ResourceId, Diagnostic> {
    raw.trim()
        .parse::<i64>()
        .map(ResourceId::Integer)
        .map_err(|_| {
            Diagnostic::error(format!("Zentral {} ID must be an integer", kind))
                .with_detail(format!("got {:?}", raw))
        })
}

/// Accept a UUID import identifier. The backend validates the format; only
/// the empty string is rejected here.
pub fn import_uuid_id(kind: &str, raw: &str) -> Result<ResourceId, Diagnostic> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        Err(Diagnostic::error(format!(
            "Zentral {} ID must not be empty",
            kind
        )))
    } else {
        Ok(ResourceId::Uuid(trimmed.to_string()))
    }
}

/// The uniform lifecycle surface the provider registry dispatches to.
#[async_trait::async_trait]
pub trait ResourceAdapter: Send + Sync {
    /// The kind slug.
    fn kind(&self) -> &'static str;

    /// The identifier kind, for import dispatch.
    fn id_kind(&self) -> IdKind;

    /// The resource schema. Static, no I/O.
    fn schema(&self) -> Schema;

    /// Create the instance from the planned state.
    async fn create(&self, client: &ZentralClient, planned: Value) -> Result<Value, ProviderError>;

    /// Refresh the instance from the backend.
    async fn read(&self, client: &ZentralClient, state: Value) -> Result<Value, ProviderError>;

    /// Update the instance to the planned state.
    async fn update(
        &self,
        client: &ZentralClient,
        prior: Value,
        planned: Value,
    ) -> Result<Value, ProviderError>;

    /// Delete the instance.
    async fn delete(&self, client: &ZentralClient, state: Value) -> Result<(), ProviderError>;

    /// Parse a user-supplied import id into a partial state.
    fn import_state(&self, raw_id: &str) -> Result<Value, Diagnostic>;
}

/// The one adapter template shared by every kind.
pub struct CollectionAdapter<M: ResourceModel> {
    _model: std::marker::PhantomData<M>,
}

impl<M: ResourceModel> CollectionAdapter<M> {
    /// Create the adapter for kind `M`.
    pub fn new() -> Self {
        Self {
            _model: std::marker::PhantomData,
        }
    }

    fn decode(state: &Value, operation: &str) -> Result<M, ProviderError> {
        decode_model::<M>(state)
            .map_err(|e| ProviderError::translation(M::KIND, operation, e.to_string()))
    }

    fn known_id(model: &M, operation: &str) -> Result<ResourceId, ProviderError> {
        model.id().ok_or_else(|| {
            ProviderError::translation(M::KIND, operation, "state has no identifier")
        })
    }
}

impl<M: ResourceModel> Default for CollectionAdapter<M> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl<M: ResourceModel> ResourceAdapter for CollectionAdapter<M> {
    fn kind(&self) -> &'static str {
        M::KIND
    }

    fn id_kind(&self) -> IdKind {
        M::ID_KIND
    }

    fn schema(&self) -> Schema {
        M::schema()
    }

    #[instrument(skip_all, fields(kind = M::KIND))]
    async fn create(&self, client: &ZentralClient, planned: Value) -> Result<Value, ProviderError> {
        let model = Self::decode(&planned, "create")?;
        let request = model.to_request().map_err(|e| e.for_operation("create"))?;
        let response: M::Response = client
            .create(M::COLLECTION, &request)
            .await
            .map_err(|e| ProviderError::backend(M::KIND, "create", None, e))?;
        // The planned model is the carryover source for anything the
        // backend does not echo.
        let new_state = M::from_response(response, Some(&model));
        Ok(encode_model(&new_state)?)
    }

    #[instrument(skip_all, fields(kind = M::KIND))]
    async fn read(&self, client: &ZentralClient, state: Value) -> Result<Value, ProviderError> {
        let model = Self::decode(&state, "read")?;
        let id = Self::known_id(&model, "read")?;
        // "Not found" propagates like any other backend error; the next
        // plan surfaces it to the operator.
        let response: M::Response = client
            .get_by_id(M::COLLECTION, &id)
            .await
            .map_err(|e| ProviderError::backend(M::KIND, "read", Some(id.to_string()), e))?;
        let new_state = M::from_response(response, Some(&model));
        Ok(encode_model(&new_state)?)
    }

    #[instrument(skip_all, fields(kind = M::KIND))]
    async fn update(
        &self,
        client: &ZentralClient,
        prior: Value,
        planned: Value,
    ) -> Result<Value, ProviderError> {
        let prior_model = Self::decode(&prior, "update")?;
        let planned_model = Self::decode(&planned, "update")?;
        let id = planned_model
            .id()
            .map_or_else(|| Self::known_id(&prior_model, "update"), Ok)?;
        let request = planned_model
            .to_request()
            .map_err(|e| e.for_operation("update"))?;
        let response: M::Response = client
            .update(M::COLLECTION, &id, &request)
            .await
            .map_err(|e| ProviderError::backend(M::KIND, "update", Some(id.to_string()), e))?;
        let new_state = M::from_response(response, Some(&planned_model));
        Ok(encode_model(&new_state)?)
    }

    #[instrument(skip_all, fields(kind = M::KIND))]
    async fn delete(&self, client: &ZentralClient, state: Value) -> Result<(), ProviderError> {
        let model = Self::decode(&state, "delete")?;
        let id = Self::known_id(&model, "delete")?;
        client
            .delete(M::COLLECTION, &id)
            .await
            .map_err(|e| ProviderError::backend(M::KIND, "delete", Some(id.to_string()), e))?;
        Ok(())
    }

    fn import_state(&self, raw_id: &str) -> Result<Value, Diagnostic> {
        let id = match M::ID_KIND {
            IdKind::Integer => import_integer_id(M::KIND, raw_id)?,
            IdKind::Uuid => import_uuid_id(M::KIND, raw_id)?,
        };
        let id_value = match id {
            ResourceId::Integer(n) => Value::from(n),
            ResourceId::Uuid(s) => Value::from(s),
        };
        Ok(serde_json::json!({ "id": id_value }))
    }
}

/// Read-only variant sharing the resource codecs.
#[async_trait::async_trait]
pub trait DataSourceAdapter: Send + Sync {
    /// The kind slug.
    fn kind(&self) -> &'static str;

    /// The data source schema, derived from the resource schema.
    fn schema(&self) -> Schema;

    /// Look up the object by id and return its state.
    async fn read(&self, client: &ZentralClient, config: Value) -> Result<Value, ProviderError>;
}

/// Data source template over a [`ResourceModel`].
pub struct CollectionDataSource<M: ResourceModel> {
    _model: std::marker::PhantomData<M>,
}

impl<M: ResourceModel> CollectionDataSource<M> {
    /// Create the data source for kind `M`.
    pub fn new() -> Self {
        Self {
            _model: std::marker::PhantomData,
        }
    }
}

impl<M: ResourceModel> Default for CollectionDataSource<M> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl<M: ResourceModel> DataSourceAdapter for CollectionDataSource<M> {
    fn kind(&self) -> &'static str {
        M::KIND
    }

    fn schema(&self) -> Schema {
        data_source_schema(M::schema(), M::ID_KIND)
    }

    #[instrument(skip_all, fields(kind = M::KIND))]
    async fn read(&self, client: &ZentralClient, config: Value) -> Result<Value, ProviderError> {
        let id = match M::ID_KIND {
            IdKind::Integer => config
                .get("id")
                .and_then(Value::as_i64)
                .map(ResourceId::Integer),
            IdKind::Uuid => config
                .get("id")
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty())
                .map(|s| ResourceId::Uuid(s.to_string())),
        }
        .ok_or_else(|| {
            ProviderError::Validation(format!("zentral_{}: the id attribute is required", M::KIND))
        })?;

        let response: M::Response = client
            .get_by_id(M::COLLECTION, &id)
            .await
            .map_err(|e| ProviderError::backend(M::KIND, "read", Some(id.to_string()), e))?;
        let model = M::from_response(response, None);
        Ok(encode_model(&model)?)
    }
}

/// Derive a data source schema from a resource schema: `id` becomes the
/// single required lookup attribute, everything else is computed.
pub fn data_source_schema(resource: Schema, id_kind: IdKind) -> Schema {
    let mut schema = resource;
    for (name, attr) in schema.block.attributes.iter_mut() {
        if name == "id" {
            attr.flags = AttributeFlags::required();
            attr.use_state_for_unknown = false;
        } else {
            attr.flags = AttributeFlags {
                computed: true,
                sensitive: attr.flags.sensitive,
                ..Default::default()
            };
            attr.default = None;
            attr.validators.clear();
            attr.use_state_for_unknown = false;
        }
    }
    if !schema.block.attributes.contains_key("id") {
        let attr = match id_kind {
            IdKind::Integer => Attribute::required_int64(),
            IdKind::Uuid => Attribute::required_string(),
        };
        schema.block.attributes.insert("id".to_string(), attr);
    }
    schema
}

/// All resource adapters, in registry order.
pub fn all_resources() -> Vec<Box<dyn ResourceAdapter>> {
    vec![
        Box::new(CollectionAdapter::<taxonomy::TaxonomyModel>::new()),
        Box::new(CollectionAdapter::<tag::TagModel>::new()),
        Box::new(CollectionAdapter::<meta_business_unit::MetaBusinessUnitModel>::new()),
        Box::new(CollectionAdapter::<santa::SantaConfigurationModel>::new()),
        Box::new(CollectionAdapter::<santa::SantaEnrollmentModel>::new()),
        Box::new(CollectionAdapter::<mdm_blueprint::MdmBlueprintModel>::new()),
        Box::new(CollectionAdapter::<mdm_artifact::MdmArtifactModel>::new()),
        Box::new(CollectionAdapter::<mdm_blueprint_artifact::MdmBlueprintArtifactModel>::new()),
        Box::new(CollectionAdapter::<mdm_scep_issuer::MdmScepIssuerModel>::new()),
        Box::new(CollectionAdapter::<monolith_repository::MonolithRepositoryModel>::new()),
    ]
}

/// All data sources, in registry order.
pub fn all_data_sources() -> Vec<Box<dyn DataSourceAdapter>> {
    vec![
        Box::new(CollectionDataSource::<taxonomy::TaxonomyModel>::new()),
        Box::new(CollectionDataSource::<tag::TagModel>::new()),
        Box::new(CollectionDataSource::<meta_business_unit::MetaBusinessUnitModel>::new()),
        Box::new(CollectionDataSource::<santa::SantaConfigurationModel>::new()),
        Box::new(CollectionDataSource::<mdm_blueprint::MdmBlueprintModel>::new()),
        Box::new(CollectionDataSource::<mdm_artifact::MdmArtifactModel>::new()),
        Box::new(CollectionDataSource::<monolith_repository::MonolithRepositoryModel>::new()),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_import_integer_id() {
        assert_eq!(
            import_integer_id("tag", "42").unwrap(),
            ResourceId::Integer(42)
        );
        assert_eq!(
            import_integer_id("tag", " 7 ").unwrap(),
            ResourceId::Integer(7)
        );

        let diag = import_integer_id("tag", "yolo").unwrap_err();
        assert_eq!(diag.summary, "Zentral tag ID must be an integer");

        let diag = import_integer_id("taxonomy", "1.5").unwrap_err();
        assert_eq!(diag.summary, "Zentral taxonomy ID must be an integer");
    }

    #[test]
    fn test_import_uuid_id() {
        assert_eq!(
            import_uuid_id("mdm_artifact", "9169a12f").unwrap(),
            ResourceId::Uuid("9169a12f".to_string())
        );
        let diag = import_uuid_id("mdm_artifact", "  ").unwrap_err();
        assert!(diag.summary.contains("must not be empty"));
    }

    #[test]
    fn test_registry_kinds_are_unique() {
        let resources = all_resources();
        let mut kinds: Vec<&str> = resources.iter().map(|r| r.kind()).collect();
        let before = kinds.len();
        kinds.sort_unstable();
        kinds.dedup();
        assert_eq!(kinds.len(), before);
    }

    #[test]
    fn test_every_resource_schema_has_an_id() {
        for resource in all_resources() {
            let schema = resource.schema();
            let id = schema
                .block
                .attributes
                .get("id")
                .unwrap_or_else(|| panic!("{} schema has no id", resource.kind()));
            assert!(id.flags.computed, "{} id must be computed", resource.kind());
            assert!(
                id.use_state_for_unknown,
                "{} id must be preserved across updates",
                resource.kind()
            );
        }
    }

    #[test]
    fn test_data_source_schema_derivation() {
        let schema = data_source_schema(tag::TagModel::schema(), IdKind::Integer);
        let id = schema.block.attributes.get("id").unwrap();
        assert!(id.flags.required);
        let name = schema.block.attributes.get("name").unwrap();
        assert!(name.flags.computed);
        assert!(!name.flags.required);
        assert!(name.validators.is_empty());
    }
}
