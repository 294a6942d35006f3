use std::fmt;
use std::path::PathBuf;

/// Coded failure kinds reported by the remote parameter store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteErrorKind {
    AccessDenied,
    InvalidCredentials,
    ParameterNotFound,
    ParameterAlreadyExists,
    InvalidKeyId,
    Validation,
    Throttling,
    Network,
    Internal,
    Other,
}

impl RemoteErrorKind {
    /// Maps a remote store error code (`AccessDeniedException`,
    /// `com.amazonaws.ssm#ParameterNotFound`, ...) to its kind.
    pub fn from_code(code: &str) -> Self {
        let code = code.rsplit('#').next().unwrap_or(code);
        let code = code.split(':').next().unwrap_or(code).trim();
        match code {
            "AccessDenied" | "AccessDeniedException" | "UnauthorizedOperation" => {
                RemoteErrorKind::AccessDenied
            }
            "UnrecognizedClientException"
            | "InvalidSignatureException"
            | "SignatureDoesNotMatch"
            | "InvalidClientTokenId"
            | "InvalidUserID.NotFound"
            | "ExpiredTokenException"
            | "MissingAuthenticationTokenException" => RemoteErrorKind::InvalidCredentials,
            "ParameterNotFound" => RemoteErrorKind::ParameterNotFound,
            "ParameterAlreadyExists" => RemoteErrorKind::ParameterAlreadyExists,
            "InvalidKeyId" => RemoteErrorKind::InvalidKeyId,
            "ValidationException" => RemoteErrorKind::Validation,
            "ThrottlingException" | "TooManyUpdates" => RemoteErrorKind::Throttling,
            "InternalServerError" | "InternalFailure" | "ServiceUnavailable" => {
                RemoteErrorKind::Internal
            }
            _ => RemoteErrorKind::Other,
        }
    }

    /// Short explanation suitable for showing to a user.
    pub fn hint(self) -> &'static str {
        match self {
            RemoteErrorKind::AccessDenied => "Access denied - check IAM permissions",
            RemoteErrorKind::InvalidCredentials => "Invalid credentials - check the profile's keys",
            RemoteErrorKind::ParameterNotFound => "Parameter not found",
            RemoteErrorKind::ParameterAlreadyExists => {
                "Parameter already exists - use overwrite to replace it"
            }
            RemoteErrorKind::InvalidKeyId => "Invalid KMS key - check KMS permissions",
            RemoteErrorKind::Validation => "Invalid parameter",
            RemoteErrorKind::Throttling => "Request throttled - try again later",
            RemoteErrorKind::Network => "Network error - unable to reach AWS",
            RemoteErrorKind::Internal => "AWS internal error",
            RemoteErrorKind::Other => "Request failed",
        }
    }
}

impl fmt::Display for RemoteErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Failure reported by a `ParameterStoreClient`.
#[derive(Debug, Clone, PartialEq, Eq, Fail)]
#[fail(display = "{}: {}", kind, message)]
pub struct RemoteError {
    pub kind: RemoteErrorKind,
    pub message: String,
}

impl RemoteError {
    pub fn new<S: Into<String>>(kind: RemoteErrorKind, message: S) -> Self {
        RemoteError {
            kind,
            message: message.into(),
        }
    }
}

/// Errors surfaced by the parameter gateway.
#[derive(Debug, Fail)]
pub enum SSMError {
    #[fail(display = "Parameter Store client not initialized")]
    NotInitialized,
    #[fail(
        display = "Failed to initialize AWS client with profile \"{}\" and region \"{}\": {}",
        profile, region, reason
    )]
    Initialization {
        profile: String,
        region: String,
        reason: String,
    },
    #[fail(
        display = "{} '{}' failed for profile \"{}\" in {}: {}",
        operation, target, profile, region, source
    )]
    Remote {
        operation: &'static str,
        target: String,
        profile: String,
        region: String,
        #[fail(cause)]
        source: RemoteError,
    },
}

impl SSMError {
    /// Remote failure kind, if the error came from the remote store.
    pub fn remote_kind(&self) -> Option<RemoteErrorKind> {
        match self {
            SSMError::Remote { source, .. } => Some(source.kind),
            _ => None,
        }
    }
}

/// A credentials or config file that exists but could not be read.
#[derive(Debug, Fail)]
#[fail(display = "Error loading AWS {} file {:?}: {}", file, path, reason)]
pub struct ProfileFileError {
    pub file: &'static str,
    pub path: PathBuf,
    pub reason: String,
}
