//! MDM SCEP issuer.
//!
//! One of three challenge backends is active at a time, selected by the
//! `backend` attribute. The request carries only the sub-object matching the
//! selected backend; a selected backend without its block is a translation
//! error, caught before any HTTP call.

use serde::{Deserialize, Serialize};

use crate::client::ResourceId;
use crate::error::ProviderError;
use crate::resources::{IdKind, ResourceModel};
use crate::schema::{Attribute, Block, NestedBlock, Schema, Validator};
use crate::value::Tv;

pub const BACKEND_MICROSOFT_CA: &str = "MICROSOFT_CA";
pub const BACKEND_OKTA_CA: &str = "OKTA_CA";
pub const BACKEND_STATIC_CHALLENGE: &str = "STATIC_CHALLENGE";

/// Microsoft NDES challenge backend settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct MicrosoftCa {
    pub url: String,
    pub username: String,
    pub password: String,
}

/// Okta CA challenge backend settings. Same wire shape as Microsoft.
pub type OktaCa = MicrosoftCa;

/// Static challenge backend settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct StaticChallenge {
    pub challenge: String,
}

/// SCEP issuer state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct MdmScepIssuerModel {
    #[serde(default, skip_serializing_if = "Tv::is_unknown")]
    pub id: Tv<i64>,
    #[serde(default, skip_serializing_if = "Tv::is_unknown")]
    pub name: Tv<String>,
    #[serde(default, skip_serializing_if = "Tv::is_unknown")]
    pub url: Tv<String>,
    #[serde(default, skip_serializing_if = "Tv::is_unknown")]
    pub key_usage: Tv<i64>,
    #[serde(default, skip_serializing_if = "Tv::is_unknown")]
    pub keysize: Tv<i64>,
    #[serde(default, skip_serializing_if = "Tv::is_unknown")]
    pub backend: Tv<String>,
    #[serde(default, skip_serializing_if = "Tv::is_unknown")]
    pub microsoft_ca: Tv<MicrosoftCa>,
    #[serde(default, skip_serializing_if = "Tv::is_unknown")]
    pub okta_ca: Tv<OktaCa>,
    #[serde(default, skip_serializing_if = "Tv::is_unknown")]
    pub static_challenge: Tv<StaticChallenge>,
}

#[derive(Debug, Serialize)]
pub struct MdmScepIssuerRequest {
    pub name: String,
    pub url: String,
    pub key_usage: i64,
    pub keysize: i64,
    pub backend: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub microsoft_ca_kwargs: Option<MicrosoftCa>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub okta_ca_kwargs: Option<OktaCa>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub static_challenge_kwargs: Option<StaticChallenge>,
}

#[derive(Debug, Deserialize)]
pub struct MdmScepIssuerResponse {
    pub id: i64,
    pub name: String,
    pub url: String,
    #[serde(default)]
    pub key_usage: i64,
    #[serde(default)]
    pub keysize: i64,
    pub backend: String,
    #[serde(default)]
    pub microsoft_ca_kwargs: Option<MicrosoftCa>,
    #[serde(default)]
    pub okta_ca_kwargs: Option<OktaCa>,
    #[serde(default)]
    pub static_challenge_kwargs: Option<StaticChallenge>,
}

fn challenge_block() -> Block {
    Block::new()
        .with_attribute("url", Attribute::required_string())
        .with_attribute("username", Attribute::required_string())
        .with_attribute("password", Attribute::required_string().sensitive())
}

impl MdmScepIssuerModel {
    fn required_block<T: Clone>(&self, block: &Tv<T>, name: &str) -> Result<T, ProviderError> {
        block.to_option().ok_or_else(|| {
            let backend = self.backend.decoded();
            ProviderError::translation(
                Self::KIND,
                "serialize",
                format!("the {} block is required when backend is {}", name, backend),
            )
        })
    }
}

impl ResourceModel for MdmScepIssuerModel {
    const KIND: &'static str = "mdm_scep_issuer";
    const COLLECTION: &'static str = "mdm/scep_issuers";
    const ID_KIND: IdKind = IdKind::Integer;

    type Request = MdmScepIssuerRequest;
    type Response = MdmScepIssuerResponse;

    fn schema() -> Schema {
        Schema::v0()
            .with_attribute("id", Attribute::id_int64())
            .with_attribute(
                "name",
                Attribute::required_string().with_validator(Validator::NonEmpty),
            )
            .with_attribute(
                "url",
                Attribute::required_string().with_validator(Validator::NonEmpty),
            )
            .with_attribute("key_usage", Attribute::default_int64(0).between(0, 5))
            .with_attribute("keysize", Attribute::default_int64(2048).between(1024, 4096))
            .with_attribute(
                "backend",
                Attribute::required_string().one_of(&[
                    BACKEND_MICROSOFT_CA,
                    BACKEND_OKTA_CA,
                    BACKEND_STATIC_CHALLENGE,
                ]),
            )
            .with_block("microsoft_ca", NestedBlock::single(challenge_block()))
            .with_block("okta_ca", NestedBlock::single(challenge_block()))
            .with_block(
                "static_challenge",
                NestedBlock::single(
                    Block::new()
                        .with_attribute("challenge", Attribute::required_string().sensitive()),
                ),
            )
    }

    fn id(&self) -> Option<ResourceId> {
        self.id.to_option().map(ResourceId::Integer)
    }

    fn to_request(&self) -> Result<Self::Request, ProviderError> {
        let backend = self.backend.decoded();
        let mut request = MdmScepIssuerRequest {
            name: self.name.decoded(),
            url: self.url.decoded(),
            key_usage: self.key_usage.decoded(),
            keysize: self.keysize.decoded(),
            backend: backend.clone(),
            microsoft_ca_kwargs: None,
            okta_ca_kwargs: None,
            static_challenge_kwargs: None,
        };
        // Only the selected backend's settings go on the wire.
        match backend.as_str() {
            BACKEND_MICROSOFT_CA => {
                request.microsoft_ca_kwargs =
                    Some(self.required_block(&self.microsoft_ca, "microsoft_ca")?);
            }
            BACKEND_OKTA_CA => {
                request.okta_ca_kwargs = Some(self.required_block(&self.okta_ca, "okta_ca")?);
            }
            BACKEND_STATIC_CHALLENGE => {
                request.static_challenge_kwargs =
                    Some(self.required_block(&self.static_challenge, "static_challenge")?);
            }
            other => {
                return Err(ProviderError::translation(
                    Self::KIND,
                    "serialize",
                    format!("unknown backend {:?}", other),
                ));
            }
        }
        Ok(request)
    }

    fn from_response(response: Self::Response, _prior: Option<&Self>) -> Self {
        Self {
            id: Tv::known(response.id),
            name: Tv::known(response.name),
            url: Tv::known(response.url),
            key_usage: Tv::known(response.key_usage),
            keysize: Tv::known(response.keysize),
            backend: Tv::known(response.backend),
            microsoft_ca: Tv::from_option(response.microsoft_ca_kwargs),
            okta_ca: Tv::from_option(response.okta_ca_kwargs),
            static_challenge: Tv::from_option(response.static_challenge_kwargs),
        }
    }
}
