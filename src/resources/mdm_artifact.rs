//! MDM artifact. UUID-keyed.

use serde::{Deserialize, Serialize};

use crate::client::ResourceId;
use crate::error::ProviderError;
use crate::resources::{IdKind, ResourceModel};
use crate::schema::{Attribute, Schema, Validator};
use crate::value::Tv;

const ARTIFACT_TYPES: &[&str] = &[
    "Activation",
    "Asset",
    "Certificate Asset",
    "Configuration",
    "Data Asset",
    "Enterprise App",
    "Manual Configuration",
    "Profile",
    "Store App",
];

/// Artifact state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct MdmArtifactModel {
    #[serde(default, skip_serializing_if = "Tv::is_unknown")]
    pub id: Tv<String>,
    #[serde(default, skip_serializing_if = "Tv::is_unknown")]
    pub name: Tv<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Tv::is_unknown")]
    pub artifact_type: Tv<String>,
    #[serde(default, skip_serializing_if = "Tv::is_unknown")]
    pub channel: Tv<String>,
    #[serde(default, skip_serializing_if = "Tv::is_unknown")]
    pub platforms: Tv<Vec<String>>,
    #[serde(default, skip_serializing_if = "Tv::is_unknown")]
    pub install_during_setup_assistant: Tv<bool>,
    #[serde(default, skip_serializing_if = "Tv::is_unknown")]
    pub auto_update: Tv<bool>,
    #[serde(default, skip_serializing_if = "Tv::is_unknown")]
    pub reinstall_interval: Tv<i64>,
    #[serde(default, skip_serializing_if = "Tv::is_unknown")]
    pub reinstall_on_os_update: Tv<String>,
    #[serde(default, skip_serializing_if = "Tv::is_unknown")]
    pub requires: Tv<Vec<String>>,
}

#[derive(Debug, Serialize)]
pub struct MdmArtifactRequest {
    pub name: String,
    #[serde(rename = "type")]
    pub artifact_type: String,
    pub channel: String,
    pub platforms: Vec<String>,
    pub install_during_setup_assistant: bool,
    pub auto_update: bool,
    pub reinstall_interval: i64,
    pub reinstall_on_os_update: String,
    pub requires: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct MdmArtifactResponse {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub artifact_type: String,
    pub channel: String,
    #[serde(default)]
    pub platforms: Option<Vec<String>>,
    #[serde(default)]
    pub install_during_setup_assistant: bool,
    #[serde(default)]
    pub auto_update: bool,
    #[serde(default)]
    pub reinstall_interval: i64,
    #[serde(default)]
    pub reinstall_on_os_update: Option<String>,
    #[serde(default)]
    pub requires: Option<Vec<String>>,
}

impl ResourceModel for MdmArtifactModel {
    const KIND: &'static str = "mdm_artifact";
    const COLLECTION: &'static str = "mdm/artifacts";
    const ID_KIND: IdKind = IdKind::Uuid;

    type Request = MdmArtifactRequest;
    type Response = MdmArtifactResponse;

    fn schema() -> Schema {
        Schema::v0()
            .with_attribute("id", Attribute::id_string())
            .with_attribute(
                "name",
                Attribute::required_string().with_validator(Validator::NonEmpty),
            )
            .with_attribute("type", Attribute::required_string().one_of(ARTIFACT_TYPES))
            .with_attribute(
                "channel",
                Attribute::required_string().one_of(&["Device", "User"]),
            )
            .with_attribute("platforms", Attribute::required_string_set())
            .with_attribute(
                "install_during_setup_assistant",
                Attribute::default_bool(false),
            )
            .with_attribute("auto_update", Attribute::default_bool(true))
            .with_attribute(
                "reinstall_interval",
                Attribute::default_int64(0).between(0, 366),
            )
            .with_attribute(
                "reinstall_on_os_update",
                Attribute::default_string("No").one_of(&["No", "Major", "Minor", "Patch"]),
            )
            .with_attribute("requires", Attribute::default_string_set())
    }

    fn id(&self) -> Option<ResourceId> {
        self.id
            .as_known()
            .filter(|s| !s.is_empty())
            .map(|s| ResourceId::Uuid(s.clone()))
    }

    fn to_request(&self) -> Result<Self::Request, ProviderError> {
        Ok(MdmArtifactRequest {
            name: self.name.decoded(),
            artifact_type: self.artifact_type.decoded(),
            channel: self.channel.decoded(),
            platforms: self.platforms.decoded(),
            install_during_setup_assistant: self.install_during_setup_assistant.decoded(),
            auto_update: self.auto_update.decoded(),
            reinstall_interval: self.reinstall_interval.decoded(),
            reinstall_on_os_update: self.reinstall_on_os_update.decoded(),
            requires: self.requires.decoded(),
        })
    }

    fn from_response(response: Self::Response, _prior: Option<&Self>) -> Self {
        Self {
            id: Tv::known(response.id),
            name: Tv::known(response.name),
            artifact_type: Tv::known(response.artifact_type),
            channel: Tv::known(response.channel),
            platforms: Tv::known_or_empty(response.platforms),
            install_during_setup_assistant: Tv::known(response.install_during_setup_assistant),
            auto_update: Tv::known(response.auto_update),
            reinstall_interval: Tv::known(response.reinstall_interval),
            reinstall_on_os_update: Tv::known(
                response
                    .reinstall_on_os_update
                    .unwrap_or_else(|| "No".to_string()),
            ),
            requires: Tv::known_or_empty(response.requires),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_type_attribute_is_renamed_on_the_wire() {
        let model = MdmArtifactModel {
            name: Tv::known("Base profile".to_string()),
            artifact_type: Tv::known("Profile".to_string()),
            channel: Tv::known("Device".to_string()),
            platforms: Tv::known(vec!["macOS".to_string()]),
            auto_update: Tv::known(true),
            reinstall_on_os_update: Tv::known("No".to_string()),
            ..Default::default()
        };
        let body = serde_json::to_value(model.to_request().unwrap()).unwrap();
        assert_eq!(body["type"], "Profile");
        assert!(body.get("artifact_type").is_none());

        let state = serde_json::to_value(&model).unwrap();
        assert_eq!(state["type"], "Profile");
    }

    #[test]
    fn test_from_response() {
        let response: MdmArtifactResponse = serde_json::from_value(json!({
            "id": "b9b6fe49-5e5f-4e0b-8e3c-31f6a55c2c1e",
            "name": "Base profile",
            "type": "Profile",
            "channel": "Device",
            "platforms": ["macOS"],
            "auto_update": true,
            "requires": null
        }))
        .unwrap();
        let model = MdmArtifactModel::from_response(response, None);
        assert_eq!(
            model.id,
            Tv::known("b9b6fe49-5e5f-4e0b-8e3c-31f6a55c2c1e".to_string())
        );
        assert_eq!(model.requires, Tv::known(vec![]));
        assert_eq!(model.reinstall_on_os_update, Tv::known("No".to_string()));
    }

    #[test]
    fn test_uuid_identifier() {
        let model = MdmArtifactModel {
            id: Tv::known("b9b6fe49".to_string()),
            ..Default::default()
        };
        assert_eq!(model.id(), Some(ResourceId::Uuid("b9b6fe49".to_string())));

        let blank = MdmArtifactModel::default();
        assert_eq!(blank.id(), None);
    }
}
