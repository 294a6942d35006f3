//! Remote parameter store abstraction.
//!
//! The gateway in `ssm_ops` only talks to the store through these traits, so
//! the transport (rusoto in production, an in-memory store in tests) can be
//! swapped without touching the access policy.

use crate::error::RemoteError;
use crate::ssm_parameters::{
    SSMDescribePage, SSMDescribeRequest, SSMParametersRequest, SSMParametersResult, SSMPutRequest,
    SSMPutResult,
};

pub type RemoteResult<T> = Result<T, RemoteError>;

/// The four operation shapes the gateway needs from a parameter store.
pub trait ParameterStoreClient {
    /// Metadata-only enumeration. Returned items must not carry values.
    fn describe_parameters(&self, req: &SSMDescribeRequest) -> RemoteResult<SSMDescribePage>;

    /// Fetches named parameters. Names the store does not know come back in
    /// `invalid_parameters` rather than as an error.
    fn get_parameters(&self, req: &SSMParametersRequest) -> RemoteResult<SSMParametersResult>;

    fn put_parameter(&self, req: &SSMPutRequest) -> RemoteResult<SSMPutResult>;

    fn delete_parameter(&self, name: &str) -> RemoteResult<()>;
}

/// Builds a client bound to one profile and region.
pub trait ClientConnector {
    fn connect(&self, profile: &str, region: &str) -> Result<Box<dyn ParameterStoreClient>, String>;
}
