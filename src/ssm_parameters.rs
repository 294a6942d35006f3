use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};

/// Parameter type as understood by the parameter store.
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParameterType {
    String,
    StringList,
    SecureString,
}

impl ParameterType {
    pub fn as_str(self) -> &'static str {
        match self {
            ParameterType::String => "String",
            ParameterType::StringList => "StringList",
            ParameterType::SecureString => "SecureString",
        }
    }

    pub fn is_secure(self) -> bool {
        self == ParameterType::SecureString
    }

    /// Lenient conversion used for remote responses: unknown or missing types read as `String`.
    pub fn from_remote(value: Option<&str>) -> Self {
        value
            .and_then(|v| v.parse().ok())
            .unwrap_or(ParameterType::String)
    }
}

impl Default for ParameterType {
    fn default() -> Self {
        ParameterType::String
    }
}

impl fmt::Display for ParameterType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Fail)]
#[fail(display = "Unknown parameter type: {}", _0)]
pub struct UnknownParameterType(pub String);

impl FromStr for ParameterType {
    type Err = UnknownParameterType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "String" => Ok(ParameterType::String),
            "StringList" => Ok(ParameterType::StringList),
            "SecureString" => Ok(ParameterType::SecureString),
            other => Err(UnknownParameterType(other.to_string())),
        }
    }
}

/// One parameter store entry. `value` is only ever present when the entry was
/// fetched individually; listings carry metadata only.
#[derive(Serialize, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ParameterStoreItem {
    pub name: String,
    #[serde(rename = "type")]
    pub p_type: ParameterType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_modified_date: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_type: Option<String>,
}

impl ParameterStoreItem {
    pub fn new<S: Into<String>>(name: S, p_type: ParameterType) -> Self {
        ParameterStoreItem {
            name: name.into(),
            p_type,
            ..Default::default()
        }
    }

    pub fn has_value(&self) -> bool {
        self.value.is_some()
    }
}

impl fmt::Debug for ParameterStoreItem {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("ParameterStoreItem")
            .field("name", &self.name)
            .field("type", &self.p_type)
            .field("value", &self.value.as_ref().map(|_| "<redacted>"))
            .field("description", &self.description)
            .field("version", &self.version)
            .field("last_modified_date", &self.last_modified_date)
            .field("data_type", &self.data_type)
            .finish()
    }
}

/// Metadata-only enumeration request, one page at a time.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SSMDescribeRequest {
    pub path: Option<String>,
    pub recursive: bool,
    pub max_results: Option<i64>,
    pub next_token: Option<String>,
}

/// One page of a metadata-only enumeration. Items never carry values.
#[derive(Debug, Default)]
pub struct SSMDescribePage {
    pub parameters: Vec<ParameterStoreItem>,
    pub next_token: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SSMParametersRequest {
    pub names: Vec<String>,
    pub with_decryption: bool,
}

#[derive(Debug, Default)]
pub struct SSMParametersResult {
    pub parameters: Vec<ParameterStoreItem>,
    pub invalid_parameters: Vec<String>,
}

#[derive(Clone, PartialEq)]
pub struct SSMPutRequest {
    pub name: String,
    pub value: String,
    pub p_type: ParameterType,
    pub description: Option<String>,
    pub overwrite: bool,
}

impl fmt::Debug for SSMPutRequest {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{{ name: {}, type: {}, overwrite: {} }}",
            self.name, self.p_type, self.overwrite
        )
    }
}

#[derive(Debug, Default)]
pub struct SSMPutResult {
    pub version: Option<i64>,
}
