//! Browse, create, edit and delete AWS SSM parameters for the profiles found
//! in the local AWS credentials and config files.
//!
//! `profiles::ProfileResolver` reads the profiles; `ssm_ops::SSMOps` gates
//! access to the parameter store of a chosen profile and region.

#[macro_use]
extern crate failure_derive;

#[macro_use]
extern crate serde_derive;

pub mod error;
pub mod ini;
#[cfg(any(test, feature = "testing"))]
pub mod memory_store;
pub mod profiles;
pub mod regions;
pub mod rusoto_store;
pub mod settings;
pub mod ssm_client;
pub mod ssm_ops;
pub mod ssm_parameters;

pub use error::{RemoteError, RemoteErrorKind, SSMError};
pub use profiles::{Profile, ProfilePaths, ProfileResolver};
pub use settings::{Selection, Settings};
pub use ssm_client::{ClientConnector, ParameterStoreClient};
pub use ssm_ops::SSMOps;
pub use ssm_parameters::{ParameterStoreItem, ParameterType};
