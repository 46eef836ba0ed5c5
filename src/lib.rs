//! Zentral provider.
//!
//! Resource adapters for managing objects in a [Zentral](https://zentral.io)
//! deployment through its REST API: inventory taxonomies, tags and meta
//! business units, Santa configurations and enrollments, MDM blueprints,
//! artifacts, blueprint artifacts and SCEP issuers, and Monolith
//! repositories.
//!
//! # Overview
//!
//! - **Value bridge**: [`value::Tv`] carries the three-valued attribute
//!   states (known, null, unknown) through typed model structs.
//! - **Schema catalog**: [`schema`] describes each kind's attribute table,
//!   validators, defaults and plan modifiers; [`validation`] checks
//!   configurations against it before any HTTP call.
//! - **Plan engine**: [`plan::plan_resource`] renders planned state from
//!   prior state and configuration, applying defaults and
//!   state-for-unknown, with order-insensitive set diffing.
//! - **Adapters**: [`resources`] binds each kind to its API collection
//!   through one shared CRUD template.
//! - **Provider**: [`provider::ZentralProvider`] implements
//!   [`provider::ProviderService`], dispatching `zentral_<kind>` type names
//!   to the registry.
//! - **Client**: [`client::ZentralClient`] speaks the bearer-token REST
//!   contract; [`testing::FakeBackend`] stands in for it in tests.
//!
//! # Quick Start
//!
//! ```ignore
//! use zentral_provider::provider::{ProviderService, ZentralProvider};
//! use serde_json::json;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let provider = ZentralProvider::new();
//! provider
//!     .configure(json!({
//!         "base_url": "https://zentral.example.com",
//!         "token": "…",
//!     }))
//!     .await?;
//!
//! let plan = provider
//!     .plan("zentral_tag", None, json!({"name": "server"}), json!({"name": "server"}))
//!     .await?;
//! let state = provider.create("zentral_tag", plan.planned_state).await?;
//! # Ok(())
//! # }
//! ```

#![warn(clippy::all)]

pub mod client;
pub mod error;
pub mod logging;
pub mod plan;
pub mod provider;
pub mod resources;
pub mod schema;
pub mod testing;
pub mod types;
pub mod validation;
pub mod value;

// Re-export main types at crate root
pub use client::{ClientConfig, ResourceId, ZentralClient};
pub use error::{ClientError, ProviderError};
pub use logging::{init_logging, init_logging_with_default, try_init_logging};
pub use plan::plan_resource;
pub use provider::{ProviderService, ZentralProvider};
pub use schema::ProviderSchema;
pub use types::{
    AttributeChange, ImportedResource, PlanResult, ProviderMetadata, ServerCapabilities,
};
pub use validation::{is_valid, validate, validate_result};
pub use value::Tv;

// Re-export async_trait for convenience
pub use async_trait::async_trait;

// Re-export commonly used external types
pub use serde_json;
pub use tracing;
