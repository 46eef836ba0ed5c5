//! Inventory taxonomy.

use serde::{Deserialize, Serialize};

use crate::client::ResourceId;
use crate::error::ProviderError;
use crate::resources::{IdKind, ResourceModel};
use crate::schema::{Attribute, Schema, Validator};
use crate::value::Tv;

/// Taxonomy state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct TaxonomyModel {
    #[serde(default, skip_serializing_if = "Tv::is_unknown")]
    pub id: Tv<i64>,
    #[serde(default, skip_serializing_if = "Tv::is_unknown")]
    pub name: Tv<String>,
}

#[derive(Debug, Serialize)]
pub struct TaxonomyRequest {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct TaxonomyResponse {
    pub id: i64,
    pub name: String,
}

impl ResourceModel for TaxonomyModel {
    const KIND: &'static str = "taxonomy";
    const COLLECTION: &'static str = "inventory/taxonomies";
    const ID_KIND: IdKind = IdKind::Integer;

    type Request = TaxonomyRequest;
    type Response = TaxonomyResponse;

    fn schema() -> Schema {
        Schema::v0()
            .with_attribute("id", Attribute::id_int64())
            .with_attribute(
                "name",
                Attribute::required_string().with_validator(Validator::NonEmpty),
            )
    }

    fn id(&self) -> Option<ResourceId> {
        self.id.to_option().map(ResourceId::Integer)
    }

    fn to_request(&self) -> Result<Self::Request, ProviderError> {
        Ok(TaxonomyRequest {
            name: self.name.decoded(),
        })
    }

    fn from_response(response: Self::Response, _prior: Option<&Self>) -> Self {
        Self {
            id: Tv::known(response.id),
            name: Tv::known(response.name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_payload() {
        let model = TaxonomyModel {
            id: Tv::Unknown,
            name: Tv::known("Desks".to_string()),
        };
        let request = model.to_request().unwrap();
        assert_eq!(serde_json::to_value(&request).unwrap(), json!({"name": "Desks"}));
    }

    #[test]
    fn test_from_response() {
        let response: TaxonomyResponse =
            serde_json::from_value(json!({"id": 4, "name": "Desks"})).unwrap();
        let model = TaxonomyModel::from_response(response, None);
        assert_eq!(model.id, Tv::known(4));
        assert_eq!(model.name, Tv::known("Desks".to_string()));
    }
}
