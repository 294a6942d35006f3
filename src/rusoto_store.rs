//! `ParameterStoreClient` over rusoto's `SsmClient`.
//!
//! This is the only place rusoto response shapes are seen; everything is
//! converted into `ssm_parameters` types before leaving the module.

use std::fmt;

use chrono::{DateTime, TimeZone, Utc};
use rusoto_core::credential::ProfileProvider;
use rusoto_core::request::BufferedHttpResponse;
use rusoto_core::{HttpClient, Region, RusotoError};
use rusoto_ssm::{
    DeleteParameterError, DeleteParameterRequest, DescribeParametersError,
    DescribeParametersRequest, GetParametersError, GetParametersRequest, Parameter,
    ParameterMetadata, ParameterStringFilter, PutParameterError, PutParameterRequest, Ssm,
    SsmClient,
};
use tracing::debug;

use crate::error::{RemoteError, RemoteErrorKind};
use crate::ssm_client::{ClientConnector, ParameterStoreClient, RemoteResult};
use crate::ssm_parameters::{
    ParameterStoreItem, ParameterType, SSMDescribePage, SSMDescribeRequest, SSMParametersRequest,
    SSMParametersResult, SSMPutRequest, SSMPutResult,
};

pub struct RusotoParameterStore {
    region: String,
    ssm_client: SsmClient,
}

impl fmt::Debug for RusotoParameterStore {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{{ region: {} }}", self.region)
    }
}

impl ParameterStoreClient for RusotoParameterStore {
    fn describe_parameters(&self, req: &SSMDescribeRequest) -> RemoteResult<SSMDescribePage> {
        let input = DescribeParametersRequest {
            max_results: req.max_results,
            next_token: req.next_token.clone(),
            parameter_filters: req.path.as_ref().map(|path| {
                vec![ParameterStringFilter {
                    key: "Path".to_string(),
                    option: Some(if req.recursive { "Recursive" } else { "OneLevel" }.to_string()),
                    values: Some(vec![path.clone()]),
                }]
            }),
            ..Default::default()
        };
        let output = self
            .ssm_client
            .describe_parameters(input)
            .sync()
            .map_err(|err| remote_error(err, describe_kind))?;

        Ok(SSMDescribePage {
            parameters: output
                .parameters
                .unwrap_or_default()
                .into_iter()
                .map(item_from_metadata)
                .collect(),
            next_token: output.next_token,
        })
    }

    fn get_parameters(&self, req: &SSMParametersRequest) -> RemoteResult<SSMParametersResult> {
        let input = GetParametersRequest {
            names: req.names.clone(),
            with_decryption: Some(req.with_decryption),
        };
        let output = self
            .ssm_client
            .get_parameters(input)
            .sync()
            .map_err(|err| remote_error(err, get_kind))?;

        Ok(SSMParametersResult {
            parameters: output
                .parameters
                .unwrap_or_default()
                .into_iter()
                .map(item_from_parameter)
                .collect(),
            invalid_parameters: output.invalid_parameters.unwrap_or_default(),
        })
    }

    fn put_parameter(&self, req: &SSMPutRequest) -> RemoteResult<SSMPutResult> {
        let input = PutParameterRequest {
            name: req.name.clone(),
            value: req.value.clone(),
            type_: req.p_type.as_str().to_string(),
            description: req.description.clone(),
            overwrite: Some(req.overwrite),
            ..Default::default()
        };
        let output = self
            .ssm_client
            .put_parameter(input)
            .sync()
            .map_err(|err| remote_error(err, put_kind))?;

        Ok(SSMPutResult {
            version: output.version,
        })
    }

    fn delete_parameter(&self, name: &str) -> RemoteResult<()> {
        let input = DeleteParameterRequest {
            name: name.to_string(),
        };
        self.ssm_client
            .delete_parameter(input)
            .sync()
            .map(|_| ())
            .map_err(|err| remote_error(err, delete_kind))
    }
}

/// Connects through the shared AWS credentials file for the requested profile.
#[derive(Debug, Default, Clone, Copy)]
pub struct RusotoConnector;

impl ClientConnector for RusotoConnector {
    fn connect(&self, profile: &str, region: &str) -> Result<Box<dyn ParameterStoreClient>, String> {
        let parsed_region = region.parse::<Region>().map_err(|e| e.to_string())?;
        let mut credentials = ProfileProvider::new().map_err(|e| e.to_string())?;
        credentials.set_profile(profile);
        let dispatcher = HttpClient::new().map_err(|e| e.to_string())?;
        debug!(profile, region, "created SSM client");

        Ok(Box::new(RusotoParameterStore {
            region: region.to_string(),
            ssm_client: SsmClient::new_with(dispatcher, credentials, parsed_region),
        }))
    }
}

fn item_from_metadata(meta: ParameterMetadata) -> ParameterStoreItem {
    ParameterStoreItem {
        name: meta.name.unwrap_or_default(),
        p_type: ParameterType::from_remote(meta.type_.as_deref()),
        value: None,
        description: meta.description,
        version: meta.version,
        last_modified_date: meta.last_modified_date.and_then(timestamp),
        data_type: None,
    }
}

fn item_from_parameter(param: Parameter) -> ParameterStoreItem {
    ParameterStoreItem {
        name: param.name.unwrap_or_default(),
        p_type: ParameterType::from_remote(param.type_.as_deref()),
        value: param.value,
        description: None,
        version: param.version,
        last_modified_date: param.last_modified_date.and_then(timestamp),
        data_type: None,
    }
}

/// The SSM JSON protocol sends timestamps as fractional epoch seconds.
fn timestamp(epoch_secs: f64) -> Option<DateTime<Utc>> {
    let secs = epoch_secs.trunc() as i64;
    let nanos = (epoch_secs.fract() * 1_000_000_000.0) as u32;
    Utc.timestamp_opt(secs, nanos).single()
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(rename = "__type")]
    error_type: Option<String>,
}

fn response_kind(response: &BufferedHttpResponse) -> RemoteErrorKind {
    let code = serde_json::from_slice::<ErrorBody>(&response.body)
        .ok()
        .and_then(|body| body.error_type);
    match code {
        Some(code) => RemoteErrorKind::from_code(&code),
        None if response.status.as_u16() == 403 => RemoteErrorKind::AccessDenied,
        None if response.status.is_server_error() => RemoteErrorKind::Internal,
        None => RemoteErrorKind::Other,
    }
}

#[allow(unreachable_patterns)]
fn remote_error<E>(err: RusotoError<E>, service_kind: fn(&E) -> RemoteErrorKind) -> RemoteError
where
    E: std::error::Error + 'static,
{
    let kind = match &err {
        RusotoError::Service(e) => service_kind(e),
        RusotoError::HttpDispatch(_) => RemoteErrorKind::Network,
        RusotoError::Credentials(_) => RemoteErrorKind::InvalidCredentials,
        RusotoError::Validation(_) => RemoteErrorKind::Validation,
        RusotoError::Unknown(response) => response_kind(response),
        _ => RemoteErrorKind::Other,
    };
    RemoteError::new(kind, err.to_string())
}

fn describe_kind(err: &DescribeParametersError) -> RemoteErrorKind {
    match err {
        DescribeParametersError::InternalServerError(_) => RemoteErrorKind::Internal,
        _ => RemoteErrorKind::Validation,
    }
}

#[allow(unreachable_patterns)]
fn get_kind(err: &GetParametersError) -> RemoteErrorKind {
    match err {
        GetParametersError::InvalidKeyId(_) => RemoteErrorKind::InvalidKeyId,
        GetParametersError::InternalServerError(_) => RemoteErrorKind::Internal,
        _ => RemoteErrorKind::Other,
    }
}

fn put_kind(err: &PutParameterError) -> RemoteErrorKind {
    match err {
        PutParameterError::ParameterAlreadyExists(_) => RemoteErrorKind::ParameterAlreadyExists,
        PutParameterError::InvalidKeyId(_) => RemoteErrorKind::InvalidKeyId,
        PutParameterError::TooManyUpdates(_) => RemoteErrorKind::Throttling,
        PutParameterError::InternalServerError(_) => RemoteErrorKind::Internal,
        _ => RemoteErrorKind::Validation,
    }
}

#[allow(unreachable_patterns)]
fn delete_kind(err: &DeleteParameterError) -> RemoteErrorKind {
    match err {
        DeleteParameterError::ParameterNotFound(_) => RemoteErrorKind::ParameterNotFound,
        DeleteParameterError::InternalServerError(_) => RemoteErrorKind::Internal,
        _ => RemoteErrorKind::Other,
    }
}
