//! Deploy a Workers script together with its static assets.
//!
//! A deploy fingerprints the asset directory, asks the service which content
//! it is missing, uploads that content in the batches the service chose and
//! finishes with one script update that references the uploaded assets.

pub mod api;
pub mod assets;
pub mod config;
pub mod credentials;
pub mod deploy;
pub mod error;

pub use api::{ApiClient, WorkersApi};
pub use config::{DeployConfig, DeployOptions, DeployPlan};
pub use credentials::{CredentialProvider, Credentials, EnvCredentials};
pub use deploy::{deploy, deploy_with_api, deploy_with_provider, DeployReport};
pub use error::{DeployError, ProtocolError, Result};
