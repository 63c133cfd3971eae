//! Cloudit provider for cloudweave
//!
//! Implements the canonical handlers against the Cloudit REST API. Cloudit
//! has one implicit VPC per tenant and no native key pairs or security group
//! membership, so those facts live in the cloudweave metadata store.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │ ClouditDriver ──► ClouditConnection           │
//! │                     │ create_*_handler        │
//! │  ┌──────────────────▼───────────────────────┐ │
//! │  │ handlers (vpc, vm, nlb, disk, keypair,   │ │
//! │  │ security, image, myimage)                │ │
//! │  └──────┬───────────────────────┬───────────┘ │
//! │         │ ClouditApi            │ store       │
//! │  ┌──────▼────────┐      ┌───────▼──────────┐  │
//! │  │ RestClient    │      │ CredentialStore  │  │
//! │  │ (token, 401)  │      │ (cloudweave)     │  │
//! │  └───────────────┘      └──────────────────┘  │
//! └──────────────────────────────────────────────┘
//! ```

pub mod api;
pub mod client;
pub mod driver;
pub mod error;
pub mod handler;
pub mod model;

// Re-exports
pub use api::{ClouditApi, RestClouditApi};
pub use client::{Engine, PasswordAuth, Reauthenticate, RestClient};
pub use driver::{CREDENTIAL_HASH_FIELDS, ClouditConnection, ClouditDriver, DRIVER_NAME};
pub use error::ClientError;
pub use handler::{
    ClouditContext, ClouditDiskHandler, ClouditImageHandler, ClouditKeyPairHandler,
    ClouditMyImageHandler, ClouditNlbHandler, ClouditSecurityHandler, ClouditVmHandler,
    ClouditVpcHandler,
};
