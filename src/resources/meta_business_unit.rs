//! Inventory meta business unit.

use serde::{Deserialize, Serialize};

use crate::client::ResourceId;
use crate::error::ProviderError;
use crate::resources::{IdKind, ResourceModel};
use crate::schema::{Attribute, Schema, Validator};
use crate::value::Tv;

/// Meta business unit state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct MetaBusinessUnitModel {
    #[serde(default, skip_serializing_if = "Tv::is_unknown")]
    pub id: Tv<i64>,
    #[serde(default, skip_serializing_if = "Tv::is_unknown")]
    pub name: Tv<String>,
    #[serde(default, skip_serializing_if = "Tv::is_unknown")]
    pub api_enrollment_enabled: Tv<bool>,
}

#[derive(Debug, Serialize)]
pub struct MetaBusinessUnitRequest {
    pub name: String,
    pub api_enrollment_enabled: bool,
}

#[derive(Debug, Deserialize)]
pub struct MetaBusinessUnitResponse {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub api_enrollment_enabled: bool,
}

impl ResourceModel for MetaBusinessUnitModel {
    const KIND: &'static str = "meta_business_unit";
    const COLLECTION: &'static str = "inventory/meta_business_units";
    const ID_KIND: IdKind = IdKind::Integer;

    type Request = MetaBusinessUnitRequest;
    type Response = MetaBusinessUnitResponse;

    fn schema() -> Schema {
        Schema::v0()
            .with_attribute("id", Attribute::id_int64())
            .with_attribute(
                "name",
                Attribute::required_string().with_validator(Validator::NonEmpty),
            )
            .with_attribute("api_enrollment_enabled", Attribute::default_bool(false))
    }

    fn id(&self) -> Option<ResourceId> {
        self.id.to_option().map(ResourceId::Integer)
    }

    fn to_request(&self) -> Result<Self::Request, ProviderError> {
        Ok(MetaBusinessUnitRequest {
            name: self.name.decoded(),
            api_enrollment_enabled: self.api_enrollment_enabled.decoded(),
        })
    }

    fn from_response(response: Self::Response, _prior: Option<&Self>) -> Self {
        Self {
            id: Tv::known(response.id),
            name: Tv::known(response.name),
            api_enrollment_enabled: Tv::known(response.api_enrollment_enabled),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_defaults_enrollment_off() {
        let model = MetaBusinessUnitModel {
            id: Tv::Unknown,
            name: Tv::known("HQ".to_string()),
            api_enrollment_enabled: Tv::Null,
        };
        let request = model.to_request().unwrap();
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({"name": "HQ", "api_enrollment_enabled": false})
        );
    }

    #[test]
    fn test_from_response() {
        let response: MetaBusinessUnitResponse = serde_json::from_value(
            json!({"id": 2, "name": "HQ", "api_enrollment_enabled": true}),
        )
        .unwrap();
        let model = MetaBusinessUnitModel::from_response(response, None);
        assert_eq!(model.id, Tv::known(2));
        assert_eq!(model.api_enrollment_enabled, Tv::known(true));
    }
}
