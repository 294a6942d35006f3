use std::fmt;

use tracing::{debug, error, info};

use crate::error::{RemoteError, RemoteErrorKind, SSMError};
use crate::rusoto_store::RusotoConnector;
use crate::ssm_client::{ClientConnector, ParameterStoreClient};
use crate::ssm_parameters::{
    ParameterStoreItem, ParameterType, SSMDescribeRequest, SSMParametersRequest, SSMPutRequest,
};

/// Page size requested from the store while listing.
pub const LIST_PAGE_SIZE: i64 = 50;

struct Binding {
    profile: String,
    region: String,
    client: Box<dyn ParameterStoreClient>,
}

impl Binding {
    fn remote_error(&self, operation: &'static str, target: &str, source: RemoteError) -> SSMError {
        error!(
            operation,
            target,
            profile = %self.profile,
            region = %self.region,
            kind = %source.kind,
            "parameter store request failed"
        );
        SSMError::Remote {
            operation,
            target: target.to_string(),
            profile: self.profile.clone(),
            region: self.region.clone(),
            source,
        }
    }
}

/// Access gateway to the parameter store of one profile and region.
///
/// Listing only ever returns metadata; a value is only obtained through
/// `get_parameter`, one name at a time.
pub struct SSMOps {
    connector: Box<dyn ClientConnector>,
    binding: Option<Binding>,
}

impl fmt::Debug for SSMOps {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.binding {
            Some(b) => write!(f, "{{ profile: {}, region: {} }}", b.profile, b.region),
            None => write!(f, "{{ uninitialized }}"),
        }
    }
}

impl Default for SSMOps {
    fn default() -> Self {
        Self::new()
    }
}

impl SSMOps {
    /// Gateway connecting through rusoto.
    pub fn new() -> Self {
        Self::with_connector(RusotoConnector)
    }

    pub fn with_connector<C: ClientConnector + 'static>(connector: C) -> Self {
        SSMOps {
            connector: Box::new(connector),
            binding: None,
        }
    }

    /// Binds a fresh client for `profile` in `region`, dropping any previous
    /// binding. On failure the gateway is left uninitialized.
    pub fn initialize(&mut self, profile: &str, region: &str) -> Result<(), SSMError> {
        self.binding = None;
        let client = self.connector.connect(profile, region).map_err(|reason| {
            error!(profile, region, %reason, "failed to initialize parameter store client");
            SSMError::Initialization {
                profile: profile.to_string(),
                region: region.to_string(),
                reason,
            }
        })?;
        self.binding = Some(Binding {
            profile: profile.to_string(),
            region: region.to_string(),
            client,
        });
        info!(profile, region, "parameter store client initialized");
        Ok(())
    }

    fn binding(&self) -> Result<&Binding, SSMError> {
        self.binding.as_ref().ok_or(SSMError::NotInitialized)
    }

    /// Metadata for every parameter under `path` (everything when `None`),
    /// sorted by name. Values are never included.
    pub fn get_parameters(
        &self,
        path: Option<&str>,
        recursive: bool,
    ) -> Result<Vec<ParameterStoreItem>, SSMError> {
        let binding = self.binding()?;
        let target = path.unwrap_or("/");
        let mut input = SSMDescribeRequest {
            path: path.map(str::to_string),
            recursive,
            max_results: Some(LIST_PAGE_SIZE),
            next_token: None,
        };
        let mut out_parms: Vec<ParameterStoreItem> = Vec::new();
        let mut pages = 0;

        loop {
            let page = binding
                .client
                .describe_parameters(&input)
                .map_err(|e| binding.remote_error("DescribeParameters", target, e))?;
            pages += 1;
            out_parms.extend(page.parameters.into_iter().map(|mut p| {
                p.value = None;
                p
            }));
            match page.next_token {
                Some(token) if !token.is_empty() => input.next_token = Some(token),
                _ => break,
            }
        }

        out_parms.sort_by(|a, b| a.name.cmp(&b.name));
        debug!(path = target, pages, count = out_parms.len(), "listed parameters");
        Ok(out_parms)
    }

    /// Fetches one parameter, its value decrypted when `with_decryption` is set.
    /// `Ok(None)` when the store has no parameter by that name. `name` goes to
    /// the store as given, so `name:version`, `name:label` and ARNs work; the
    /// returned item carries the store's plain name.
    ///
    /// A `SecureString` read without decryption comes back without a value.
    pub fn get_parameter(
        &self,
        name: &str,
        with_decryption: bool,
    ) -> Result<Option<ParameterStoreItem>, SSMError> {
        let binding = self.binding()?;
        let input = SSMParametersRequest {
            names: vec![name.to_string()],
            with_decryption,
        };
        let output = match binding.client.get_parameters(&input) {
            Ok(output) => output,
            Err(ref e) if e.kind == RemoteErrorKind::ParameterNotFound => {
                debug!(name, "parameter not found");
                return Ok(None);
            }
            Err(e) => return Err(binding.remote_error("GetParameters", name, e)),
        };

        if output.invalid_parameters.iter().any(|n| n == name) {
            debug!(name, "parameter not found");
            return Ok(None);
        }

        let item = output
            .parameters
            .into_iter()
            .next()
            .map(|mut p| {
                if p.p_type.is_secure() && !with_decryption {
                    p.value = None;
                }
                p
            });
        Ok(item)
    }

    /// Creates `name`, or replaces it when `overwrite` is set. Writing over an
    /// existing name without `overwrite` fails in the store.
    pub fn put_parameter(
        &self,
        name: &str,
        value: &str,
        p_type: ParameterType,
        description: Option<&str>,
        overwrite: bool,
    ) -> Result<(), SSMError> {
        let binding = self.binding()?;
        let input = SSMPutRequest {
            name: name.to_string(),
            value: value.to_string(),
            p_type,
            description: description.map(str::to_string),
            overwrite,
        };
        let output = binding
            .client
            .put_parameter(&input)
            .map_err(|e| binding.remote_error("PutParameter", name, e))?;
        info!(name, p_type = %p_type, version = ?output.version, "parameter saved");
        Ok(())
    }

    pub fn delete_parameter(&self, name: &str) -> Result<(), SSMError> {
        let binding = self.binding()?;
        binding
            .client
            .delete_parameter(name)
            .map_err(|e| binding.remote_error("DeleteParameter", name, e))?;
        info!(name, "parameter deleted");
        Ok(())
    }

    pub fn current_profile(&self) -> Option<&str> {
        self.binding.as_ref().map(|b| b.profile.as_str())
    }

    pub fn current_region(&self) -> Option<&str> {
        self.binding.as_ref().map(|b| b.region.as_str())
    }

    pub fn is_initialized(&self) -> bool {
        self.binding.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory_store::{stored, MemoryParameterStore, CIPHERTEXT_PLACEHOLDER};

    fn ready(store: &MemoryParameterStore) -> SSMOps {
        let mut ssm = SSMOps::with_connector(store.clone());
        ssm.initialize("dev", "eu-west-1").unwrap();
        ssm
    }

    #[test]
    fn uninitialized_operations_fail() {
        let ssm = SSMOps::with_connector(MemoryParameterStore::new());
        assert!(!ssm.is_initialized());
        assert!(ssm.current_profile().is_none());
        assert!(ssm.current_region().is_none());
        assert!(matches!(ssm.get_parameters(None, true), Err(SSMError::NotInitialized)));
        assert!(matches!(ssm.get_parameter("/a", true), Err(SSMError::NotInitialized)));
        assert!(matches!(
            ssm.put_parameter("/a", "v", ParameterType::String, None, false),
            Err(SSMError::NotInitialized)
        ));
        assert!(matches!(ssm.delete_parameter("/a"), Err(SSMError::NotInitialized)));
    }

    #[test]
    fn initialize_binds_profile_and_region() {
        let store = MemoryParameterStore::new();
        let ssm = ready(&store);
        assert!(ssm.is_initialized());
        assert_eq!(ssm.current_profile(), Some("dev"));
        assert_eq!(ssm.current_region(), Some("eu-west-1"));
        assert_eq!(store.connections(), vec![("dev".to_string(), "eu-west-1".to_string())]);
    }

    #[test]
    fn failed_initialize_leaves_gateway_uninitialized() {
        let store = MemoryParameterStore::new();
        let mut ssm = ready(&store);
        store.refuse_connections("no such region");

        let err = ssm.initialize("prod", "mars-1").unwrap_err();
        match err {
            SSMError::Initialization { profile, region, reason } => {
                assert_eq!(profile, "prod");
                assert_eq!(region, "mars-1");
                assert_eq!(reason, "no such region");
            }
            other => panic!("unexpected error: {:?}", other),
        }
        assert!(!ssm.is_initialized());
        assert!(matches!(ssm.get_parameters(None, true), Err(SSMError::NotInitialized)));
    }

    #[test]
    fn reinitialize_rebinds() {
        let store = MemoryParameterStore::new();
        let mut ssm = ready(&store);
        ssm.initialize("prod", "us-east-1").unwrap();
        assert_eq!(ssm.current_profile(), Some("prod"));
        assert_eq!(ssm.current_region(), Some("us-east-1"));
        assert_eq!(store.connections().len(), 2);
    }

    #[test]
    fn listing_is_sorted_across_pages_and_never_has_values() {
        let store = MemoryParameterStore::new()
            .with_page_size(2)
            .leaking_values_in_listing();
        store.insert(stored("/b", ParameterType::SecureString, "secret-b"));
        store.insert(stored("/a", ParameterType::String, "plain-a"));
        store.insert(stored("/c", ParameterType::StringList, "x,y"));
        let ssm = ready(&store);

        let items = ssm.get_parameters(None, true).unwrap();
        let names: Vec<&str> = items.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["/a", "/b", "/c"]);
        assert!(items.iter().all(|p| p.value.is_none()));
        assert_eq!(items[1].p_type, ParameterType::SecureString);
        assert_eq!(items[1].version, Some(1));

        let requests = store.describe_requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].next_token, None);
        assert_eq!(requests[1].next_token.as_deref(), Some("2"));
        assert!(requests.iter().all(|r| r.max_results == Some(LIST_PAGE_SIZE)));
        assert!(store.get_requests().is_empty());
    }

    #[test]
    fn listing_passes_path_filter() {
        let store = MemoryParameterStore::new();
        store.insert(stored("/app/db/url", ParameterType::String, "u"));
        store.insert(stored("/app/name", ParameterType::String, "n"));
        store.insert(stored("/other/name", ParameterType::String, "o"));
        let ssm = ready(&store);

        let recursive = ssm.get_parameters(Some("/app"), true).unwrap();
        assert_eq!(recursive.len(), 2);
        let one_level = ssm.get_parameters(Some("/app"), false).unwrap();
        assert_eq!(one_level.len(), 1);
        assert_eq!(one_level[0].name, "/app/name");

        let requests = store.describe_requests();
        assert_eq!(requests[1].path.as_deref(), Some("/app"));
        assert!(!requests[1].recursive);
    }

    #[test]
    fn listing_failure_carries_context() {
        let store = MemoryParameterStore::new();
        let ssm = ready(&store);
        store.fail_next(RemoteError::new(RemoteErrorKind::AccessDenied, "not allowed"));

        let err = ssm.get_parameters(None, true).unwrap_err();
        assert_eq!(err.remote_kind(), Some(RemoteErrorKind::AccessDenied));
        let text = err.to_string();
        assert!(text.contains("DescribeParameters"));
        assert!(text.contains("dev"));
        assert!(text.contains("eu-west-1"));
    }

    #[test]
    fn secure_value_only_with_decryption() {
        let store = MemoryParameterStore::new();
        store.insert(stored("/db/password", ParameterType::SecureString, "hunter2"));
        let ssm = ready(&store);

        let decrypted = ssm.get_parameter("/db/password", true).unwrap().unwrap();
        assert_eq!(decrypted.value.as_deref(), Some("hunter2"));

        let metadata_only = ssm.get_parameter("/db/password", false).unwrap().unwrap();
        assert!(metadata_only.value.is_none());
        assert_ne!(metadata_only.value.as_deref(), Some(CIPHERTEXT_PLACEHOLDER));

        let listed = ssm.get_parameters(None, true).unwrap();
        assert!(listed[0].value.is_none());

        let requests = store.get_requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].names, vec!["/db/password".to_string()]);
        assert!(requests[0].with_decryption);
        assert!(!requests[1].with_decryption);
    }

    #[test]
    fn selector_names_return_the_stored_parameter() {
        let store = MemoryParameterStore::new();
        store.insert(stored("/app/key", ParameterType::SecureString, "v1"));
        let ssm = ready(&store);

        let item = ssm.get_parameter("/app/key:1", true).unwrap().unwrap();
        assert_eq!(item.name, "/app/key");
        assert_eq!(item.value.as_deref(), Some("v1"));
        assert_eq!(store.get_requests()[0].names, vec!["/app/key:1".to_string()]);

        assert!(ssm.get_parameter("/app/missing:1", true).unwrap().is_none());
    }

    #[test]
    fn plain_value_without_decryption() {
        let store = MemoryParameterStore::new();
        store.insert(stored("/app/url", ParameterType::String, "https://example.com"));
        let ssm = ready(&store);
        let item = ssm.get_parameter("/app/url", false).unwrap().unwrap();
        assert_eq!(item.value.as_deref(), Some("https://example.com"));
    }

    #[test]
    fn missing_parameter_is_none() {
        let store = MemoryParameterStore::new();
        let ssm = ready(&store);
        assert!(ssm.get_parameter("/nope", true).unwrap().is_none());

        store.fail_next(RemoteError::new(RemoteErrorKind::ParameterNotFound, "gone"));
        assert!(ssm.get_parameter("/nope", true).unwrap().is_none());
    }

    #[test]
    fn get_failure_propagates() {
        let store = MemoryParameterStore::new();
        let ssm = ready(&store);
        store.fail_next(RemoteError::new(RemoteErrorKind::InvalidKeyId, "kms"));
        let err = ssm.get_parameter("/db/password", true).unwrap_err();
        assert_eq!(err.remote_kind(), Some(RemoteErrorKind::InvalidKeyId));
    }

    #[test]
    fn put_creates_and_overwrites() {
        let store = MemoryParameterStore::new();
        let ssm = ready(&store);

        ssm.put_parameter("/app/key", "one", ParameterType::String, Some("first"), false)
            .unwrap();
        let err = ssm
            .put_parameter("/app/key", "two", ParameterType::String, None, false)
            .unwrap_err();
        assert_eq!(err.remote_kind(), Some(RemoteErrorKind::ParameterAlreadyExists));
        assert_eq!(store.get("/app/key").unwrap().value.as_deref(), Some("one"));

        ssm.put_parameter("/app/key", "two", ParameterType::SecureString, None, true)
            .unwrap();
        let saved = store.get("/app/key").unwrap();
        assert_eq!(saved.value.as_deref(), Some("two"));
        assert_eq!(saved.p_type, ParameterType::SecureString);
        assert_eq!(saved.version, Some(2));
    }

    #[test]
    fn delete_removes_and_reports_missing() {
        let store = MemoryParameterStore::new();
        store.insert(stored("/app/key", ParameterType::String, "v"));
        let ssm = ready(&store);

        ssm.delete_parameter("/app/key").unwrap();
        assert!(store.is_empty());

        let err = ssm.delete_parameter("/app/key").unwrap_err();
        assert_eq!(err.remote_kind(), Some(RemoteErrorKind::ParameterNotFound));
        assert!(err.to_string().contains("DeleteParameter"));
    }
}
