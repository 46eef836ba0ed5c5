//! Santa configurations and enrollments.
//!
//! `client_mode` is a string in configuration (`MONITOR`, `LOCKDOWN`) and an
//! integer on the wire (1, 2). Enrollments wrap the shared enrollment secret
//! group and expose the computed `secret` and server-managed `version`.

use serde::{Deserialize, Serialize};

use crate::client::ResourceId;
use crate::error::ProviderError;
use crate::resources::blocks::{Enrollment, EnrollmentSecretRequest, EnrollmentSecretResponse};
use crate::resources::{IdKind, ResourceModel};
use crate::schema::{Attribute, Schema, Validator};
use crate::value::Tv;

const CLIENT_MODE_MONITOR: i64 = 1;
const CLIENT_MODE_LOCKDOWN: i64 = 2;

fn client_mode_to_wire(mode: &str) -> Result<i64, String> {
    match mode {
        "MONITOR" => Ok(CLIENT_MODE_MONITOR),
        "LOCKDOWN" => Ok(CLIENT_MODE_LOCKDOWN),
        other => Err(format!("unknown client mode {:?}", other)),
    }
}

fn client_mode_from_wire(mode: i64) -> String {
    match mode {
        CLIENT_MODE_LOCKDOWN => "LOCKDOWN".to_string(),
        _ => "MONITOR".to_string(),
    }
}

/// Santa configuration state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct SantaConfigurationModel {
    #[serde(default, skip_serializing_if = "Tv::is_unknown")]
    pub id: Tv<i64>,
    #[serde(default, skip_serializing_if = "Tv::is_unknown")]
    pub name: Tv<String>,
    #[serde(default, skip_serializing_if = "Tv::is_unknown")]
    pub client_mode: Tv<String>,
    #[serde(default, skip_serializing_if = "Tv::is_unknown")]
    pub client_certificate_auth: Tv<bool>,
    #[serde(default, skip_serializing_if = "Tv::is_unknown")]
    pub batch_size: Tv<i64>,
    #[serde(default, skip_serializing_if = "Tv::is_unknown")]
    pub full_sync_interval: Tv<i64>,
    #[serde(default, skip_serializing_if = "Tv::is_unknown")]
    pub enable_bundles: Tv<bool>,
    #[serde(default, skip_serializing_if = "Tv::is_unknown")]
    pub enable_transitive_rules: Tv<bool>,
    #[serde(default, skip_serializing_if = "Tv::is_unknown")]
    pub allowed_path_regex: Tv<String>,
    #[serde(default, skip_serializing_if = "Tv::is_unknown")]
    pub blocked_path_regex: Tv<String>,
    #[serde(default, skip_serializing_if = "Tv::is_unknown")]
    pub block_usb_mount: Tv<bool>,
    #[serde(default, skip_serializing_if = "Tv::is_unknown")]
    pub remount_usb_mode: Tv<Vec<String>>,
    #[serde(default, skip_serializing_if = "Tv::is_unknown")]
    pub allow_unknown_shard: Tv<i64>,
    #[serde(default, skip_serializing_if = "Tv::is_unknown")]
    pub enable_all_event_upload_shard: Tv<i64>,
}

#[derive(Debug, Serialize)]
pub struct SantaConfigurationRequest {
    pub name: String,
    pub client_mode: i64,
    pub client_certificate_auth: bool,
    pub batch_size: i64,
    pub full_sync_interval: i64,
    pub enable_bundles: bool,
    pub enable_transitive_rules: bool,
    pub allowed_path_regex: String,
    pub blocked_path_regex: String,
    pub block_usb_mount: bool,
    pub remount_usb_mode: Vec<String>,
    pub allow_unknown_shard: i64,
    pub enable_all_event_upload_shard: i64,
}

#[derive(Debug, Deserialize)]
pub struct SantaConfigurationResponse {
    pub id: i64,
    pub name: String,
    pub client_mode: i64,
    #[serde(default)]
    pub client_certificate_auth: bool,
    pub batch_size: i64,
    pub full_sync_interval: i64,
    #[serde(default)]
    pub enable_bundles: bool,
    #[serde(default)]
    pub enable_transitive_rules: bool,
    #[serde(default)]
    pub allowed_path_regex: Option<String>,
    #[serde(default)]
    pub blocked_path_regex: Option<String>,
    #[serde(default)]
    pub block_usb_mount: bool,
    #[serde(default)]
    pub remount_usb_mode: Option<Vec<String>>,
    pub allow_unknown_shard: i64,
    pub enable_all_event_upload_shard: i64,
}

impl ResourceModel for SantaConfigurationModel {
    const KIND: &'static str = "santa_configuration";
    const COLLECTION: &'static str = "santa/configurations";
    const ID_KIND: IdKind = IdKind::Integer;

    type Request = SantaConfigurationRequest;
    type Response = SantaConfigurationResponse;

    fn schema() -> Schema {
        Schema::v0()
            .with_attribute("id", Attribute::id_int64())
            .with_attribute(
                "name",
                Attribute::required_string().with_validator(Validator::NonEmpty),
            )
            .with_attribute(
                "client_mode",
                Attribute::default_string("MONITOR").one_of(&["MONITOR", "LOCKDOWN"]),
            )
            .with_attribute("client_certificate_auth", Attribute::default_bool(false))
            .with_attribute("batch_size", Attribute::default_int64(50).between(5, 100))
            .with_attribute(
                "full_sync_interval",
                Attribute::default_int64(600).between(60, 86400),
            )
            .with_attribute("enable_bundles", Attribute::default_bool(false))
            .with_attribute("enable_transitive_rules", Attribute::default_bool(false))
            .with_attribute("allowed_path_regex", Attribute::default_string(""))
            .with_attribute("blocked_path_regex", Attribute::default_string(""))
            .with_attribute("block_usb_mount", Attribute::default_bool(false))
            .with_attribute("remount_usb_mode", Attribute::default_string_set())
            .with_attribute(
                "allow_unknown_shard",
                Attribute::default_int64(100).between(0, 100),
            )
            .with_attribute(
                "enable_all_event_upload_shard",
                Attribute::default_int64(0).between(0, 100),
            )
    }

    fn id(&self) -> Option<ResourceId> {
        self.id.to_option().map(ResourceId::Integer)
    }

    fn to_request(&self) -> Result<Self::Request, ProviderError> {
        let client_mode = client_mode_to_wire(&self.client_mode.decoded())
            .map_err(|e| ProviderError::translation(Self::KIND, "serialize", e))?;
        Ok(SantaConfigurationRequest {
            name: self.name.decoded(),
            client_mode,
            client_certificate_auth: self.client_certificate_auth.decoded(),
            batch_size: self.batch_size.decoded(),
            full_sync_interval: self.full_sync_interval.decoded(),
            enable_bundles: self.enable_bundles.decoded(),
            enable_transitive_rules: self.enable_transitive_rules.decoded(),
            allowed_path_regex: self.allowed_path_regex.decoded(),
            blocked_path_regex: self.blocked_path_regex.decoded(),
            block_usb_mount: self.block_usb_mount.decoded(),
            remount_usb_mode: self.remount_usb_mode.decoded(),
            allow_unknown_shard: self.allow_unknown_shard.decoded(),
            enable_all_event_upload_shard: self.enable_all_event_upload_shard.decoded(),
        })
    }

    fn from_response(response: Self::Response, _prior: Option<&Self>) -> Self {
        Self {
            id: Tv::known(response.id),
            name: Tv::known(response.name),
            client_mode: Tv::known(client_mode_from_wire(response.client_mode)),
            client_certificate_auth: Tv::known(response.client_certificate_auth),
            batch_size: Tv::known(response.batch_size),
            full_sync_interval: Tv::known(response.full_sync_interval),
            enable_bundles: Tv::known(response.enable_bundles),
            enable_transitive_rules: Tv::known(response.enable_transitive_rules),
            allowed_path_regex: Tv::known_or_blank(response.allowed_path_regex),
            blocked_path_regex: Tv::known_or_blank(response.blocked_path_regex),
            block_usb_mount: Tv::known(response.block_usb_mount),
            remount_usb_mode: Tv::known_or_empty(response.remount_usb_mode),
            allow_unknown_shard: Tv::known(response.allow_unknown_shard),
            enable_all_event_upload_shard: Tv::known(response.enable_all_event_upload_shard),
        }
    }
}

/// Santa enrollment state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct SantaEnrollmentModel {
    #[serde(default, skip_serializing_if = "Tv::is_unknown")]
    pub id: Tv<i64>,
    #[serde(default, skip_serializing_if = "Tv::is_unknown")]
    pub configuration_id: Tv<i64>,
    #[serde(flatten)]
    pub enrollment: Enrollment,
    #[serde(default, skip_serializing_if = "Tv::is_unknown")]
    pub secret: Tv<String>,
    #[serde(default, skip_serializing_if = "Tv::is_unknown")]
    pub version: Tv<i64>,
}

#[derive(Debug, Serialize)]
pub struct SantaEnrollmentRequest {
    pub configuration: i64,
    pub secret: EnrollmentSecretRequest,
}

#[derive(Debug, Deserialize)]
pub struct SantaEnrollmentResponse {
    pub id: i64,
    pub configuration: i64,
    pub secret: EnrollmentSecretResponse,
    pub version: i64,
}

impl ResourceModel for SantaEnrollmentModel {
    const KIND: &'static str = "santa_enrollment";
    const COLLECTION: &'static str = "santa/enrollments";
    const ID_KIND: IdKind = IdKind::Integer;

    type Request = SantaEnrollmentRequest;
    type Response = SantaEnrollmentResponse;

    fn schema() -> Schema {
        Enrollment::extend_schema(
            Schema::v0()
                .with_attribute("id", Attribute::id_int64())
                .with_attribute("configuration_id", Attribute::required_int64()),
        )
    }

    fn id(&self) -> Option<ResourceId> {
        self.id.to_option().map(ResourceId::Integer)
    }

    fn to_request(&self) -> Result<Self::Request, ProviderError> {
        Ok(SantaEnrollmentRequest {
            configuration: self.configuration_id.decoded(),
            secret: self.enrollment.to_secret_request(),
        })
    }

    fn from_response(response: Self::Response, _prior: Option<&Self>) -> Self {
        Self {
            id: Tv::known(response.id),
            configuration_id: Tv::known(response.configuration),
            enrollment: Enrollment::from_secret_response(&response.secret),
            secret: Tv::known(response.secret.secret),
            version: Tv::known(response.version),
        }
    }
}
