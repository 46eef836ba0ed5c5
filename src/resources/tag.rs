//! Inventory tag.
//!
//! `color` is optional: the backend assigns a random color when the request
//! omits it, so the attribute is also computed and carried across unchanged
//! updates. The state attribute `taxonomy_id` maps to the request field
//! `taxonomy`.

use serde::{Deserialize, Serialize};

use crate::client::ResourceId;
use crate::error::ProviderError;
use crate::resources::{IdKind, ResourceModel};
use crate::schema::{Attribute, AttributeFlags, AttributeType, Schema, Validator};
use crate::value::Tv;

/// Tag state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct TagModel {
    #[serde(default, skip_serializing_if = "Tv::is_unknown")]
    pub id: Tv<i64>,
    #[serde(default, skip_serializing_if = "Tv::is_unknown")]
    pub taxonomy_id: Tv<i64>,
    #[serde(default, skip_serializing_if = "Tv::is_unknown")]
    pub name: Tv<String>,
    #[serde(default, skip_serializing_if = "Tv::is_unknown")]
    pub color: Tv<String>,
}

#[derive(Debug, Serialize)]
pub struct TagRequest {
    pub taxonomy: Option<i64>,
    pub name: String,
    /// Absent when unset so the backend picks a color.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TagResponse {
    pub id: i64,
    #[serde(default)]
    pub taxonomy: Option<i64>,
    pub name: String,
    pub color: String,
}

impl ResourceModel for TagModel {
    const KIND: &'static str = "tag";
    const COLLECTION: &'static str = "inventory/tags";
    const ID_KIND: IdKind = IdKind::Integer;

    type Request = TagRequest;
    type Response = TagResponse;

    fn schema() -> Schema {
        Schema::v0()
            .with_attribute("id", Attribute::id_int64())
            .with_attribute("taxonomy_id", Attribute::optional_int64())
            .with_attribute(
                "name",
                Attribute::required_string().with_validator(Validator::NonEmpty),
            )
            .with_attribute(
                "color",
                Attribute::new(AttributeType::String, AttributeFlags::optional_computed())
                    .with_validator(Validator::ExactLength(6))
                    .with_use_state_for_unknown(),
            )
    }

    fn id(&self) -> Option<ResourceId> {
        self.id.to_option().map(ResourceId::Integer)
    }

    fn to_request(&self) -> Result<Self::Request, ProviderError> {
        Ok(TagRequest {
            taxonomy: self.taxonomy_id.to_option(),
            name: self.name.decoded(),
            color: self.color.to_option(),
        })
    }

    fn from_response(response: Self::Response, _prior: Option<&Self>) -> Self {
        Self {
            id: Tv::known(response.id),
            taxonomy_id: Tv::from_option(response.taxonomy),
            name: Tv::known(response.name),
            color: Tv::known(response.color),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_omits_unset_color() {
        let model = TagModel {
            id: Tv::Unknown,
            taxonomy_id: Tv::Null,
            name: Tv::known("server".to_string()),
            color: Tv::Unknown,
        };
        let request = model.to_request().unwrap();
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({"taxonomy": null, "name": "server"})
        );
    }

    #[test]
    fn test_request_with_taxonomy_and_color() {
        let model = TagModel {
            id: Tv::known(1),
            taxonomy_id: Tv::known(4),
            name: Tv::known("server".to_string()),
            color: Tv::known("ff0000".to_string()),
        };
        let request = model.to_request().unwrap();
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({"taxonomy": 4, "name": "server", "color": "ff0000"})
        );
    }

    #[test]
    fn test_from_response_null_taxonomy() {
        let response: TagResponse = serde_json::from_value(
            json!({"id": 9, "taxonomy": null, "name": "server", "color": "0079bf"}),
        )
        .unwrap();
        let model = TagModel::from_response(response, None);
        assert_eq!(model.id, Tv::known(9));
        // A tag outside any taxonomy stays null, not unknown.
        assert_eq!(model.taxonomy_id, Tv::Null);
        assert_eq!(model.color, Tv::known("0079bf".to_string()));
    }
}
