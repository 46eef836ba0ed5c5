//! MDM blueprint.
//!
//! The three `collect_*` attributes are strings in configuration (`NO`,
//! `MANAGED_ONLY`, `ALL`) and integers on the wire (0, 1, 2).

use serde::{Deserialize, Serialize};

use crate::client::ResourceId;
use crate::error::ProviderError;
use crate::resources::{IdKind, ResourceModel};
use crate::schema::{Attribute, Schema, Validator};
use crate::value::Tv;

const COLLECT_NO: i64 = 0;
const COLLECT_MANAGED_ONLY: i64 = 1;
const COLLECT_ALL: i64 = 2;

fn collect_to_wire(value: &str) -> Result<i64, String> {
    match value {
        "NO" => Ok(COLLECT_NO),
        "MANAGED_ONLY" => Ok(COLLECT_MANAGED_ONLY),
        "ALL" => Ok(COLLECT_ALL),
        other => Err(format!("unknown collection scope {:?}", other)),
    }
}

fn collect_from_wire(value: i64) -> String {
    match value {
        COLLECT_MANAGED_ONLY => "MANAGED_ONLY".to_string(),
        COLLECT_ALL => "ALL".to_string(),
        _ => "NO".to_string(),
    }
}

fn collect_attribute() -> Attribute {
    Attribute::default_string("NO").one_of(&["NO", "MANAGED_ONLY", "ALL"])
}

/// Blueprint state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct MdmBlueprintModel {
    #[serde(default, skip_serializing_if = "Tv::is_unknown")]
    pub id: Tv<i64>,
    #[serde(default, skip_serializing_if = "Tv::is_unknown")]
    pub name: Tv<String>,
    #[serde(default, skip_serializing_if = "Tv::is_unknown")]
    pub inventory_interval: Tv<i64>,
    #[serde(default, skip_serializing_if = "Tv::is_unknown")]
    pub collect_apps: Tv<String>,
    #[serde(default, skip_serializing_if = "Tv::is_unknown")]
    pub collect_certificates: Tv<String>,
    #[serde(default, skip_serializing_if = "Tv::is_unknown")]
    pub collect_profiles: Tv<String>,
}

#[derive(Debug, Serialize)]
pub struct MdmBlueprintRequest {
    pub name: String,
    pub inventory_interval: i64,
    pub collect_apps: i64,
    pub collect_certificates: i64,
    pub collect_profiles: i64,
}

#[derive(Debug, Deserialize)]
pub struct MdmBlueprintResponse {
    pub id: i64,
    pub name: String,
    pub inventory_interval: i64,
    pub collect_apps: i64,
    pub collect_certificates: i64,
    pub collect_profiles: i64,
}

impl ResourceModel for MdmBlueprintModel {
    const KIND: &'static str = "mdm_blueprint";
    const COLLECTION: &'static str = "mdm/blueprints";
    const ID_KIND: IdKind = IdKind::Integer;

    type Request = MdmBlueprintRequest;
    type Response = MdmBlueprintResponse;

    fn schema() -> Schema {
        Schema::v0()
            .with_attribute("id", Attribute::id_int64())
            .with_attribute(
                "name",
                Attribute::required_string().with_validator(Validator::NonEmpty),
            )
            .with_attribute(
                "inventory_interval",
                Attribute::default_int64(86400).between(14400, 604800),
            )
            .with_attribute("collect_apps", collect_attribute())
            .with_attribute("collect_certificates", collect_attribute())
            .with_attribute("collect_profiles", collect_attribute())
    }

    fn id(&self) -> Option<ResourceId> {
        self.id.to_option().map(ResourceId::Integer)
    }

    fn to_request(&self) -> Result<Self::Request, ProviderError> {
        let translate = |value: &Tv<String>| {
            collect_to_wire(&value.decoded())
                .map_err(|e| ProviderError::translation(Self::KIND, "serialize", e))
        };
        Ok(MdmBlueprintRequest {
            name: self.name.decoded(),
            inventory_interval: self.inventory_interval.decoded(),
            collect_apps: translate(&self.collect_apps)?,
            collect_certificates: translate(&self.collect_certificates)?,
            collect_profiles: translate(&self.collect_profiles)?,
        })
    }

    fn from_response(response: Self::Response, _prior: Option<&Self>) -> Self {
        Self {
            id: Tv::known(response.id),
            name: Tv::known(response.name),
            inventory_interval: Tv::known(response.inventory_interval),
            collect_apps: Tv::known(collect_from_wire(response.collect_apps)),
            collect_certificates: Tv::known(collect_from_wire(response.collect_certificates)),
            collect_profiles: Tv::known(collect_from_wire(response.collect_profiles)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_collect_codec() {
        assert_eq!(collect_to_wire("NO").unwrap(), 0);
        assert_eq!(collect_to_wire("MANAGED_ONLY").unwrap(), 1);
        assert_eq!(collect_to_wire("ALL").unwrap(), 2);
        assert!(collect_to_wire("SOME").is_err());
        assert_eq!(collect_from_wire(0), "NO");
        assert_eq!(collect_from_wire(2), "ALL");
    }

    #[test]
    fn test_request_encodes_scopes() {
        let model = MdmBlueprintModel {
            name: Tv::known("Default".to_string()),
            inventory_interval: Tv::known(86400),
            collect_apps: Tv::known("ALL".to_string()),
            collect_certificates: Tv::known("MANAGED_ONLY".to_string()),
            collect_profiles: Tv::known("NO".to_string()),
            ..Default::default()
        };
        let request = model.to_request().unwrap();
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({
                "name": "Default",
                "inventory_interval": 86400,
                "collect_apps": 2,
                "collect_certificates": 1,
                "collect_profiles": 0
            })
        );
    }

    #[test]
    fn test_from_response_decodes_scopes() {
        let response: MdmBlueprintResponse = serde_json::from_value(json!({
            "id": 3, "name": "Default", "inventory_interval": 86400,
            "collect_apps": 2, "collect_certificates": 1, "collect_profiles": 0
        }))
        .unwrap();
        let model = MdmBlueprintModel::from_response(response, None);
        assert_eq!(model.collect_apps, Tv::known("ALL".to_string()));
        assert_eq!(model.collect_certificates, Tv::known("MANAGED_ONLY".to_string()));
        assert_eq!(model.collect_profiles, Tv::known("NO".to_string()));
    }
}
