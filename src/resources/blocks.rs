//! Shared attribute groups reused across resource kinds.
//!
//! Three groups recur in the Zentral API: shard-based scoping (blueprint
//! artifacts), per-platform gating (blueprint artifacts) and enrollment
//! secrets (Santa enrollments). Each group is a model fragment flattened
//! into the owning kind's state, a schema extension, and the request and
//! response payload shapes.

use serde::{Deserialize, Serialize};

use crate::schema::{Attribute, Block, NestedBlock, Schema};
use crate::value::Tv;

/// Per-tag shard override, state shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct TagShard {
    /// Tag to override the shard for.
    pub tag_id: i64,
    /// Shard value for machines carrying the tag.
    pub shard: i64,
}

/// Per-tag shard override, wire shape (`tag` instead of `tag_id`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagShardPayload {
    /// Tag primary key.
    pub tag: i64,
    /// Shard value.
    pub shard: i64,
}

/// Shard-based scoping, flattened into the owning state.
///
/// `shard_modulo` and `default_shard` default to 100 (everything in scope);
/// the tag collections default to empty. Defaults are applied at plan time,
/// so an omitted scoping group and an explicitly spelled-out default one
/// produce identical state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Scoping {
    #[serde(default, skip_serializing_if = "Tv::is_unknown")]
    pub shard_modulo: Tv<i64>,
    #[serde(default, skip_serializing_if = "Tv::is_unknown")]
    pub default_shard: Tv<i64>,
    #[serde(default, skip_serializing_if = "Tv::is_unknown")]
    pub excluded_tag_ids: Tv<Vec<i64>>,
    #[serde(default, skip_serializing_if = "Tv::is_unknown")]
    pub tag_shards: Tv<Vec<TagShard>>,
}

impl Scoping {
    /// Extend a schema with the scoping attributes.
    pub fn extend_schema(schema: Schema) -> Schema {
        schema
            .with_attribute(
                "shard_modulo",
                Attribute::default_int64(100).between(1, 100),
            )
            .with_attribute(
                "default_shard",
                Attribute::default_int64(100).between(0, 100),
            )
            .with_attribute("excluded_tag_ids", Attribute::default_int64_set())
            .with_block(
                "tag_shards",
                NestedBlock::set(
                    Block::new()
                        .with_attribute("tag_id", Attribute::required_int64())
                        .with_attribute("shard", Attribute::required_int64().between(0, 100)),
                ),
            )
    }

    /// The wire representation of `tag_shards`.
    pub fn tag_shard_payloads(&self) -> Vec<TagShardPayload> {
        self.tag_shards
            .decoded()
            .into_iter()
            .map(|ts| TagShardPayload {
                tag: ts.tag_id,
                shard: ts.shard,
            })
            .collect()
    }

    /// Rebuild the state fragment from the wire representation.
    pub fn from_payload(
        shard_modulo: i64,
        default_shard: i64,
        excluded_tags: Option<Vec<i64>>,
        tag_shards: Option<Vec<TagShardPayload>>,
    ) -> Self {
        Self {
            shard_modulo: Tv::known(shard_modulo),
            default_shard: Tv::known(default_shard),
            excluded_tag_ids: Tv::known_or_empty(excluded_tags),
            tag_shards: Tv::known(
                tag_shards
                    .unwrap_or_default()
                    .into_iter()
                    .map(|ts| TagShard {
                        tag_id: ts.tag,
                        shard: ts.shard,
                    })
                    .collect(),
            ),
        }
    }
}

/// Per-platform gating, flattened into the owning state.
///
/// Each platform has an enabled flag (default false) and min/max version
/// strings (default empty, meaning unbounded).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct PlatformGating {
    #[serde(default, skip_serializing_if = "Tv::is_unknown")]
    pub ios: Tv<bool>,
    #[serde(default, skip_serializing_if = "Tv::is_unknown")]
    pub ios_min_version: Tv<String>,
    #[serde(default, skip_serializing_if = "Tv::is_unknown")]
    pub ios_max_version: Tv<String>,
    #[serde(default, skip_serializing_if = "Tv::is_unknown")]
    pub ipados: Tv<bool>,
    #[serde(default, skip_serializing_if = "Tv::is_unknown")]
    pub ipados_min_version: Tv<String>,
    #[serde(default, skip_serializing_if = "Tv::is_unknown")]
    pub ipados_max_version: Tv<String>,
    #[serde(default, skip_serializing_if = "Tv::is_unknown")]
    pub macos: Tv<bool>,
    #[serde(default, skip_serializing_if = "Tv::is_unknown")]
    pub macos_min_version: Tv<String>,
    #[serde(default, skip_serializing_if = "Tv::is_unknown")]
    pub macos_max_version: Tv<String>,
    #[serde(default, skip_serializing_if = "Tv::is_unknown")]
    pub tvos: Tv<bool>,
    #[serde(default, skip_serializing_if = "Tv::is_unknown")]
    pub tvos_min_version: Tv<String>,
    #[serde(default, skip_serializing_if = "Tv::is_unknown")]
    pub tvos_max_version: Tv<String>,
}

/// Platform gating, wire shape. Same attribute names, concrete values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct PlatformGatingPayload {
    pub ios: bool,
    pub ios_min_version: String,
    pub ios_max_version: String,
    pub ipados: bool,
    pub ipados_min_version: String,
    pub ipados_max_version: String,
    pub macos: bool,
    pub macos_min_version: String,
    pub macos_max_version: String,
    pub tvos: bool,
    pub tvos_min_version: String,
    pub tvos_max_version: String,
}

impl PlatformGating {
    /// Extend a schema with the platform gating attributes.
    pub fn extend_schema(mut schema: Schema) -> Schema {
        for platform in ["ios", "ipados", "macos", "tvos"] {
            schema = schema
                .with_attribute(platform, Attribute::default_bool(false))
                .with_attribute(
                    format!("{}_min_version", platform),
                    Attribute::default_string(""),
                )
                .with_attribute(
                    format!("{}_max_version", platform),
                    Attribute::default_string(""),
                );
        }
        schema
    }

    /// The wire representation.
    pub fn to_payload(&self) -> PlatformGatingPayload {
        PlatformGatingPayload {
            ios: self.ios.decoded(),
            ios_min_version: self.ios_min_version.decoded(),
            ios_max_version: self.ios_max_version.decoded(),
            ipados: self.ipados.decoded(),
            ipados_min_version: self.ipados_min_version.decoded(),
            ipados_max_version: self.ipados_max_version.decoded(),
            macos: self.macos.decoded(),
            macos_min_version: self.macos_min_version.decoded(),
            macos_max_version: self.macos_max_version.decoded(),
            tvos: self.tvos.decoded(),
            tvos_min_version: self.tvos_min_version.decoded(),
            tvos_max_version: self.tvos_max_version.decoded(),
        }
    }

    /// Rebuild the state fragment from the wire representation.
    pub fn from_payload(payload: PlatformGatingPayload) -> Self {
        Self {
            ios: Tv::known(payload.ios),
            ios_min_version: Tv::known(payload.ios_min_version),
            ios_max_version: Tv::known(payload.ios_max_version),
            ipados: Tv::known(payload.ipados),
            ipados_min_version: Tv::known(payload.ipados_min_version),
            ipados_max_version: Tv::known(payload.ipados_max_version),
            macos: Tv::known(payload.macos),
            macos_min_version: Tv::known(payload.macos_min_version),
            macos_max_version: Tv::known(payload.macos_max_version),
            tvos: Tv::known(payload.tvos),
            tvos_min_version: Tv::known(payload.tvos_min_version),
            tvos_max_version: Tv::known(payload.tvos_max_version),
        }
    }
}

/// Enrollment secret restrictions, flattened into the owning state.
///
/// The owning kind exposes `secret` and `version` as computed attributes;
/// both live in [`EnrollmentSecretResponse`], not here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Enrollment {
    #[serde(default, skip_serializing_if = "Tv::is_unknown")]
    pub meta_business_unit_id: Tv<i64>,
    #[serde(default, skip_serializing_if = "Tv::is_unknown")]
    pub tag_ids: Tv<Vec<i64>>,
    #[serde(default, skip_serializing_if = "Tv::is_unknown")]
    pub serial_numbers: Tv<Vec<String>>,
    #[serde(default, skip_serializing_if = "Tv::is_unknown")]
    pub udids: Tv<Vec<String>>,
    #[serde(default, skip_serializing_if = "Tv::is_unknown")]
    pub quota: Tv<i64>,
}

/// Enrollment secret, request shape (nested under `secret`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrollmentSecretRequest {
    pub meta_business_unit: i64,
    pub tags: Vec<i64>,
    pub serial_numbers: Vec<String>,
    pub udids: Vec<String>,
    pub quota: Option<i64>,
}

/// Enrollment secret, response shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrollmentSecretResponse {
    pub secret: String,
    pub meta_business_unit: i64,
    #[serde(default)]
    pub tags: Option<Vec<i64>>,
    #[serde(default)]
    pub serial_numbers: Option<Vec<String>>,
    #[serde(default)]
    pub udids: Option<Vec<String>>,
    #[serde(default)]
    pub quota: Option<i64>,
}

impl Enrollment {
    /// Extend a schema with the enrollment restriction attributes plus the
    /// computed `secret` and `version`.
    pub fn extend_schema(schema: Schema) -> Schema {
        schema
            .with_attribute("meta_business_unit_id", Attribute::required_int64())
            .with_attribute("tag_ids", Attribute::default_int64_set())
            .with_attribute(
                "serial_numbers",
                Attribute::new(
                    crate::schema::AttributeType::set(crate::schema::AttributeType::String),
                    crate::schema::AttributeFlags::optional_computed(),
                )
                .with_default(serde_json::json!([])),
            )
            .with_attribute(
                "udids",
                Attribute::new(
                    crate::schema::AttributeType::set(crate::schema::AttributeType::String),
                    crate::schema::AttributeFlags::optional_computed(),
                )
                .with_default(serde_json::json!([])),
            )
            .with_attribute("quota", Attribute::optional_int64().between(1, 500000))
            .with_attribute(
                "secret",
                Attribute::computed_string()
                    .sensitive()
                    .with_use_state_for_unknown(),
            )
            .with_attribute(
                "version",
                Attribute::computed_int64().with_use_state_for_unknown(),
            )
    }

    /// The nested request payload.
    pub fn to_secret_request(&self) -> EnrollmentSecretRequest {
        EnrollmentSecretRequest {
            meta_business_unit: self.meta_business_unit_id.decoded(),
            tags: self.tag_ids.decoded(),
            serial_numbers: self.serial_numbers.decoded(),
            udids: self.udids.decoded(),
            quota: self.quota.to_option(),
        }
    }

    /// Rebuild the state fragment from the response payload.
    pub fn from_secret_response(secret: &EnrollmentSecretResponse) -> Self {
        Self {
            meta_business_unit_id: Tv::known(secret.meta_business_unit),
            tag_ids: Tv::known_or_empty(secret.tags.clone()),
            serial_numbers: Tv::known_or_empty(secret.serial_numbers.clone()),
            udids: Tv::known_or_empty(secret.udids.clone()),
            quota: Tv::from_option(secret.quota),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_scoping_schema_defaults() {
        let schema = Scoping::extend_schema(Schema::v0());
        let modulo = schema.block.attributes.get("shard_modulo").unwrap();
        assert_eq!(modulo.default, Some(json!(100)));
        let excluded = schema.block.attributes.get("excluded_tag_ids").unwrap();
        assert_eq!(excluded.default, Some(json!([])));
        assert!(schema.block.blocks.contains_key("tag_shards"));
    }

    #[test]
    fn test_scoping_payload_round_trip() {
        let scoping = Scoping {
            shard_modulo: Tv::known(10),
            default_shard: Tv::known(2),
            excluded_tag_ids: Tv::known(vec![4]),
            tag_shards: Tv::known(vec![TagShard { tag_id: 7, shard: 5 }]),
        };
        let payloads = scoping.tag_shard_payloads();
        assert_eq!(payloads, vec![TagShardPayload { tag: 7, shard: 5 }]);

        let rebuilt = Scoping::from_payload(10, 2, Some(vec![4]), Some(payloads));
        assert_eq!(rebuilt, scoping);
    }

    #[test]
    fn test_scoping_from_sparse_payload() {
        let scoping = Scoping::from_payload(100, 100, None, None);
        // Absent collections come back as known empty, never null.
        assert_eq!(scoping.excluded_tag_ids, Tv::known(vec![]));
        assert_eq!(scoping.tag_shards, Tv::known(vec![]));
    }

    #[test]
    fn test_platform_gating_schema_has_twelve_attributes() {
        let schema = PlatformGating::extend_schema(Schema::v0());
        assert_eq!(schema.block.attributes.len(), 12);
        let macos = schema.block.attributes.get("macos").unwrap();
        assert_eq!(macos.default, Some(json!(false)));
        let min = schema.block.attributes.get("tvos_min_version").unwrap();
        assert_eq!(min.default, Some(json!("")));
    }

    #[test]
    fn test_platform_gating_payload_round_trip() {
        let gating = PlatformGating {
            macos: Tv::known(true),
            macos_min_version: Tv::known("14.0".to_string()),
            ..Default::default()
        };
        let payload = gating.to_payload();
        assert!(payload.macos);
        assert_eq!(payload.macos_min_version, "14.0");
        // Unset platforms collapse to their defaults.
        assert!(!payload.ios);
        assert_eq!(payload.ios_min_version, "");

        let rebuilt = PlatformGating::from_payload(payload);
        assert_eq!(rebuilt.macos, Tv::known(true));
        assert_eq!(rebuilt.ios, Tv::known(false));
    }

    #[test]
    fn test_enrollment_secret_request() {
        let enrollment = Enrollment {
            meta_business_unit_id: Tv::known(3),
            tag_ids: Tv::known(vec![1, 2]),
            serial_numbers: Tv::Null,
            udids: Tv::Null,
            quota: Tv::Null,
        };
        let secret = enrollment.to_secret_request();
        assert_eq!(secret.meta_business_unit, 3);
        assert_eq!(secret.tags, vec![1, 2]);
        assert!(secret.serial_numbers.is_empty());
        assert_eq!(secret.quota, None);
    }

    #[test]
    fn test_enrollment_from_response() {
        let response = EnrollmentSecretResponse {
            secret: "s3cret".to_string(),
            meta_business_unit: 3,
            tags: None,
            serial_numbers: Some(vec!["C02XXXXX".to_string()]),
            udids: None,
            quota: Some(10),
        };
        let enrollment = Enrollment::from_secret_response(&response);
        assert_eq!(enrollment.meta_business_unit_id, Tv::known(3));
        assert_eq!(enrollment.tag_ids, Tv::known(vec![]));
        assert_eq!(
            enrollment.serial_numbers,
            Tv::known(vec!["C02XXXXX".to_string()])
        );
        assert_eq!(enrollment.quota, Tv::known(10));
    }
}
