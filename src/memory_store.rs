//! In-process parameter store.
//!
//! Behaves like the remote store for the operations the gateway uses (paged
//! metadata listing, unknown names reported as invalid, overwrite protection,
//! not-found on delete) and records every request it receives. It also acts
//! as its own `ClientConnector`, so every connection shares the same data.

use std::cell::RefCell;
use std::rc::Rc;

use crate::error::{RemoteError, RemoteErrorKind};
use crate::ssm_client::{ClientConnector, ParameterStoreClient, RemoteResult};
use crate::ssm_parameters::{
    ParameterStoreItem, ParameterType, SSMDescribePage, SSMDescribeRequest, SSMParametersRequest,
    SSMParametersResult, SSMPutRequest, SSMPutResult,
};

/// Value handed back for a `SecureString` read without decryption.
pub const CIPHERTEXT_PLACEHOLDER: &str = "AQICAHiCiphertextPlaceholder==";

#[derive(Default)]
struct MemoryState {
    params: Vec<ParameterStoreItem>,
    page_size: Option<usize>,
    leak_values_in_listing: bool,
    fail_next: Option<RemoteError>,
    refuse_connections: Option<String>,
    connections: Vec<(String, String)>,
    describe_requests: Vec<SSMDescribeRequest>,
    get_requests: Vec<SSMParametersRequest>,
}

#[derive(Clone, Default)]
pub struct MemoryParameterStore {
    state: Rc<RefCell<MemoryState>>,
}

impl MemoryParameterStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Caps every listing page at `size` items regardless of the requested maximum.
    pub fn with_page_size(self, size: usize) -> Self {
        self.state.borrow_mut().page_size = Some(size.max(1));
        self
    }

    /// Makes listings return stored values too, like a misbehaving store would.
    pub fn leaking_values_in_listing(self) -> Self {
        self.state.borrow_mut().leak_values_in_listing = true;
        self
    }

    /// Stores `item` as-is, replacing any parameter with the same name. Listing
    /// order follows insertion order.
    pub fn insert(&self, item: ParameterStoreItem) {
        let mut state = self.state.borrow_mut();
        state.params.retain(|p| p.name != item.name);
        state.params.push(item);
    }

    pub fn get(&self, name: &str) -> Option<ParameterStoreItem> {
        self.state.borrow().params.iter().find(|p| p.name == name).cloned()
    }

    pub fn len(&self) -> usize {
        self.state.borrow().params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The next request of any kind fails with `err`.
    pub fn fail_next(&self, err: RemoteError) {
        self.state.borrow_mut().fail_next = Some(err);
    }

    pub fn refuse_connections<S: Into<String>>(&self, reason: S) {
        self.state.borrow_mut().refuse_connections = Some(reason.into());
    }

    /// `(profile, region)` of every successful `connect`.
    pub fn connections(&self) -> Vec<(String, String)> {
        self.state.borrow().connections.clone()
    }

    pub fn describe_requests(&self) -> Vec<SSMDescribeRequest> {
        self.state.borrow().describe_requests.clone()
    }

    pub fn get_requests(&self) -> Vec<SSMParametersRequest> {
        self.state.borrow().get_requests.clone()
    }

    fn take_failure(&self) -> RemoteResult<()> {
        match self.state.borrow_mut().fail_next.take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

/// Drops a `:version` or `:label` suffix; the store answers with the plain name.
fn without_selector(name: &str) -> &str {
    if name.starts_with("arn:") {
        return name;
    }
    match name.rsplit_once(':') {
        Some((base, _)) if !base.is_empty() => base,
        _ => name,
    }
}

fn matches_path(name: &str, path: Option<&str>, recursive: bool) -> bool {
    let path = match path {
        Some(path) => path.trim_end_matches('/'),
        None => return true,
    };
    let rest = match name.strip_prefix(path) {
        Some(rest) => rest,
        None => return false,
    };
    match rest.strip_prefix('/') {
        Some(child) => recursive || !child.contains('/'),
        None => false,
    }
}

impl ParameterStoreClient for MemoryParameterStore {
    fn describe_parameters(&self, req: &SSMDescribeRequest) -> RemoteResult<SSMDescribePage> {
        self.state.borrow_mut().describe_requests.push(req.clone());
        self.take_failure()?;

        let state = self.state.borrow();
        let start = match req.next_token.as_deref() {
            Some(token) => token.parse::<usize>().map_err(|_| {
                RemoteError::new(RemoteErrorKind::Validation, format!("invalid next token {}", token))
            })?,
            None => 0,
        };
        let requested = req.max_results.map(|m| m.max(1) as usize).unwrap_or(50);
        let size = state.page_size.map_or(requested, |s| s.min(requested));

        let matching: Vec<&ParameterStoreItem> = state
            .params
            .iter()
            .filter(|p| matches_path(&p.name, req.path.as_deref(), req.recursive))
            .collect();
        let parameters = matching
            .iter()
            .skip(start)
            .take(size)
            .map(|p| {
                let mut item = (*p).clone();
                if !state.leak_values_in_listing {
                    item.value = None;
                }
                item
            })
            .collect();
        let next = start + size;

        Ok(SSMDescribePage {
            parameters,
            next_token: if next < matching.len() {
                Some(next.to_string())
            } else {
                None
            },
        })
    }

    fn get_parameters(&self, req: &SSMParametersRequest) -> RemoteResult<SSMParametersResult> {
        self.state.borrow_mut().get_requests.push(req.clone());
        self.take_failure()?;

        let mut result = SSMParametersResult::default();
        for name in &req.names {
            match self.get(without_selector(name)) {
                Some(mut item) => {
                    if item.p_type.is_secure() && !req.with_decryption {
                        item.value = Some(CIPHERTEXT_PLACEHOLDER.to_string());
                    }
                    result.parameters.push(item);
                }
                None => result.invalid_parameters.push(name.clone()),
            }
        }
        Ok(result)
    }

    fn put_parameter(&self, req: &SSMPutRequest) -> RemoteResult<SSMPutResult> {
        self.take_failure()?;

        let existing = self.get(&req.name);
        if existing.is_some() && !req.overwrite {
            return Err(RemoteError::new(
                RemoteErrorKind::ParameterAlreadyExists,
                format!("The parameter {} already exists.", req.name),
            ));
        }
        let version = existing.and_then(|p| p.version).unwrap_or(0) + 1;
        let description = req.description.clone();
        self.insert(ParameterStoreItem {
            value: Some(req.value.clone()),
            description,
            version: Some(version),
            last_modified_date: Some(chrono::Utc::now()),
            data_type: Some("text".to_string()),
            ..ParameterStoreItem::new(req.name.clone(), req.p_type)
        });
        Ok(SSMPutResult {
            version: Some(version),
        })
    }

    fn delete_parameter(&self, name: &str) -> RemoteResult<()> {
        self.take_failure()?;

        let mut state = self.state.borrow_mut();
        let before = state.params.len();
        state.params.retain(|p| p.name != name);
        if state.params.len() == before {
            return Err(RemoteError::new(
                RemoteErrorKind::ParameterNotFound,
                format!("Parameter {} not found.", name),
            ));
        }
        Ok(())
    }
}

impl ClientConnector for MemoryParameterStore {
    fn connect(&self, profile: &str, region: &str) -> Result<Box<dyn ParameterStoreClient>, String> {
        if let Some(reason) = self.state.borrow().refuse_connections.clone() {
            return Err(reason);
        }
        self.state
            .borrow_mut()
            .connections
            .push((profile.to_string(), region.to_string()));
        Ok(Box::new(self.clone()))
    }
}

/// Convenience for building stored parameters in one expression.
pub fn stored<S: Into<String>, V: Into<String>>(name: S, p_type: ParameterType, value: V) -> ParameterStoreItem {
    ParameterStoreItem {
        value: Some(value.into()),
        version: Some(1),
        ..ParameterStoreItem::new(name, p_type)
    }
}
