//! MDM blueprint artifact: binds an artifact to a blueprint with platform
//! gating and shard-based scoping.
//!
//! State attribute names differ from the wire in two places: `blueprint_id`
//! and `artifact_id` map to `blueprint` and `artifact`, and
//! `excluded_tag_ids` maps to `excluded_tags`.

use serde::{Deserialize, Serialize};

use crate::client::ResourceId;
use crate::error::ProviderError;
use crate::resources::blocks::{PlatformGating, PlatformGatingPayload, Scoping, TagShardPayload};
use crate::resources::{IdKind, ResourceModel};
use crate::schema::{Attribute, Schema};
use crate::value::Tv;

/// Blueprint artifact state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct MdmBlueprintArtifactModel {
    #[serde(default, skip_serializing_if = "Tv::is_unknown")]
    pub id: Tv<i64>,
    #[serde(default, skip_serializing_if = "Tv::is_unknown")]
    pub blueprint_id: Tv<i64>,
    #[serde(default, skip_serializing_if = "Tv::is_unknown")]
    pub artifact_id: Tv<String>,
    #[serde(flatten)]
    pub platforms: PlatformGating,
    #[serde(flatten)]
    pub scoping: Scoping,
}

#[derive(Debug, Serialize)]
pub struct MdmBlueprintArtifactRequest {
    pub blueprint: i64,
    pub artifact: String,
    #[serde(flatten)]
    pub platforms: PlatformGatingPayload,
    pub shard_modulo: i64,
    pub default_shard: i64,
    pub excluded_tags: Vec<i64>,
    pub tag_shards: Vec<TagShardPayload>,
}

#[derive(Debug, Deserialize)]
pub struct MdmBlueprintArtifactResponse {
    pub id: i64,
    pub blueprint: i64,
    pub artifact: String,
    #[serde(flatten)]
    pub platforms: PlatformGatingPayload,
    pub shard_modulo: i64,
    pub default_shard: i64,
    #[serde(default)]
    pub excluded_tags: Option<Vec<i64>>,
    #[serde(default)]
    pub tag_shards: Option<Vec<TagShardPayload>>,
}

impl ResourceModel for MdmBlueprintArtifactModel {
    const KIND: &'static str = "mdm_blueprint_artifact";
    const COLLECTION: &'static str = "mdm/blueprint_artifacts";
    const ID_KIND: IdKind = IdKind::Integer;

    type Request = MdmBlueprintArtifactRequest;
    type Response = MdmBlueprintArtifactResponse;

    fn schema() -> Schema {
        let schema = Schema::v0()
            .with_attribute("id", Attribute::id_int64())
            .with_attribute("blueprint_id", Attribute::required_int64())
            .with_attribute("artifact_id", Attribute::required_string());
        Scoping::extend_schema(PlatformGating::extend_schema(schema))
    }

    fn id(&self) -> Option<ResourceId> {
        self.id.to_option().map(ResourceId::Integer)
    }

    fn to_request(&self) -> Result<Self::Request, ProviderError> {
        Ok(MdmBlueprintArtifactRequest {
            blueprint: self.blueprint_id.decoded(),
            artifact: self.artifact_id.decoded(),
            platforms: self.platforms.to_payload(),
            shard_modulo: self.scoping.shard_modulo.decoded(),
            default_shard: self.scoping.default_shard.decoded(),
            excluded_tags: self.scoping.excluded_tag_ids.decoded(),
            tag_shards: self.scoping.tag_shard_payloads(),
        })
    }

    fn from_response(response: Self::Response, _prior: Option<&Self>) -> Self {
        Self {
            id: Tv::known(response.id),
            blueprint_id: Tv::known(response.blueprint),
            artifact_id: Tv::known(response.artifact),
            platforms: PlatformGating::from_payload(response.platforms),
            scoping: Scoping::from_payload(
                response.shard_modulo,
                response.default_shard,
                response.excluded_tags,
                response.tag_shards,
            ),
        }
    }
}
