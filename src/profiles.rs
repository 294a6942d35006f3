//! Local AWS profile resolution.
//!
//! Profiles come from the shared `credentials` file and are then completed by
//! the shared `config` file, where sections other than `default` carry a
//! `profile ` prefix. Unreadable files are logged and treated as empty so a
//! load always yields a usable, possibly partial, list.

use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, error, warn};

use crate::error::ProfileFileError;
use crate::ini::{parse_ini, IniSections};

pub const DEFAULT_PROFILE: &str = "default";
const CONFIG_PROFILE_PREFIX: &str = "profile ";

/// One named set of credentials and defaults.
#[derive(Serialize, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_key_id: Option<String>,
    #[serde(skip_serializing)]
    pub secret_access_key: Option<String>,
    #[serde(skip_serializing)]
    pub session_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role_arn: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_profile: Option<String>,
}

impl Profile {
    pub fn new<S: Into<String>>(name: S) -> Self {
        Profile {
            name: name.into(),
            ..Default::default()
        }
    }

    fn from_credentials(name: &str, entries: &HashMap<String, String>) -> Self {
        let get = |key: &str| entries.get(key).cloned();
        Profile {
            name: name.to_string(),
            region: get("region"),
            access_key_id: get("aws_access_key_id"),
            secret_access_key: get("aws_secret_access_key"),
            session_token: get("aws_session_token"),
            role_arn: get("role_arn"),
            source_profile: get("source_profile"),
        }
    }

    /// Applies the settings a `config` file section may carry. Credential keys are ignored.
    fn merge_config(&mut self, entries: &HashMap<String, String>) {
        let non_empty = |key: &str| entries.get(key).filter(|v| !v.is_empty()).cloned();
        if let Some(region) = non_empty("region") {
            self.region = Some(region);
        }
        if let Some(role_arn) = non_empty("role_arn") {
            self.role_arn = Some(role_arn);
        }
        if let Some(source_profile) = non_empty("source_profile") {
            self.source_profile = Some(source_profile);
        }
    }
}

impl fmt::Debug for Profile {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let redacted = |v: &Option<String>| v.as_ref().map(|_| "<redacted>");
        f.debug_struct("Profile")
            .field("name", &self.name)
            .field("region", &self.region)
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &redacted(&self.secret_access_key))
            .field("session_token", &redacted(&self.session_token))
            .field("role_arn", &self.role_arn)
            .field("source_profile", &self.source_profile)
            .finish()
    }
}

/// Locations of the shared credentials and config files.
#[derive(Debug, Clone, PartialEq)]
pub struct ProfilePaths {
    pub credentials: PathBuf,
    pub config: PathBuf,
}

impl ProfilePaths {
    pub fn new<C: Into<PathBuf>, F: Into<PathBuf>>(credentials: C, config: F) -> Self {
        ProfilePaths {
            credentials: credentials.into(),
            config: config.into(),
        }
    }

    /// `~/.aws/credentials` and `~/.aws/config`.
    pub fn from_home() -> Option<Self> {
        dirs::home_dir().map(|home| Self::in_dir(home.join(".aws")))
    }

    pub fn in_dir<P: AsRef<Path>>(dir: P) -> Self {
        let dir = dir.as_ref();
        Self::new(dir.join("credentials"), dir.join("config"))
    }
}

#[derive(Debug)]
pub struct ProfileResolver {
    paths: ProfilePaths,
    profiles: Vec<Profile>,
}

impl ProfileResolver {
    pub fn new() -> Self {
        let paths = ProfilePaths::from_home().unwrap_or_else(|| {
            warn!("home directory unknown, looking for AWS files under ./.aws");
            ProfilePaths::in_dir(".aws")
        });
        Self::with_paths(paths)
    }

    pub fn with_paths(paths: ProfilePaths) -> Self {
        ProfileResolver {
            paths,
            profiles: Vec::new(),
        }
    }

    pub fn paths(&self) -> &ProfilePaths {
        &self.paths
    }

    /// Re-reads both files and returns the merged profiles, credentials file order first.
    pub fn load_profiles(&mut self) -> &[Profile] {
        let mut profiles: Vec<Profile> = read_sections("credentials", &self.paths.credentials)
            .iter()
            .map(|(name, entries)| Profile::from_credentials(name, entries))
            .collect();

        for (section, entries) in read_sections("config", &self.paths.config).iter() {
            let name = section
                .strip_prefix(CONFIG_PROFILE_PREFIX)
                .unwrap_or(section.as_str());
            let index = match profiles.iter().position(|p| p.name == name) {
                Some(index) => index,
                None => {
                    profiles.push(Profile::new(name));
                    profiles.len() - 1
                }
            };
            profiles[index].merge_config(entries);
        }

        debug!(count = profiles.len(), "loaded AWS profiles");
        self.profiles = profiles;
        &self.profiles
    }

    /// Profiles from the last `load_profiles` call.
    pub fn profiles(&self) -> &[Profile] {
        &self.profiles
    }

    pub fn get_profile(&self, name: &str) -> Option<&Profile> {
        self.profiles.iter().find(|p| p.name == name)
    }

    /// The `default` profile, else the first one loaded.
    pub fn get_default_profile(&self) -> Option<&Profile> {
        self.get_profile(DEFAULT_PROFILE)
            .or_else(|| self.profiles.first())
    }

    /// The profile's own region, else its source profile's region. Only one
    /// `source_profile` hop is followed; an empty `region=` counts as unset.
    pub fn get_region_for_profile(&self, name: &str) -> Option<&str> {
        let profile = self.get_profile(name)?;
        if let Some(region) = non_empty_region(profile) {
            return Some(region);
        }
        let source = profile.source_profile.as_deref()?;
        non_empty_region(self.get_profile(source)?)
    }
}

impl Default for ProfileResolver {
    fn default() -> Self {
        Self::new()
    }
}

fn non_empty_region(profile: &Profile) -> Option<&str> {
    profile.region.as_deref().filter(|r| !r.is_empty())
}

fn read_sections(file: &'static str, path: &Path) -> IniSections {
    match fs::read_to_string(path) {
        Ok(content) => parse_ini(&content),
        Err(ref e) if e.kind() == io::ErrorKind::NotFound => {
            debug!(file, path = %path.display(), "AWS file not found");
            IniSections::new()
        }
        Err(e) => {
            let err = ProfileFileError {
                file,
                path: path.to_path_buf(),
                reason: e.to_string(),
            };
            error!("{}", err);
            IniSections::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn load(credentials: Option<&str>, config: Option<&str>) -> (TempDir, ProfileResolver) {
        let dir = tempfile::tempdir().unwrap();
        let paths = ProfilePaths::in_dir(dir.path());
        if let Some(content) = credentials {
            fs::write(&paths.credentials, content).unwrap();
        }
        if let Some(content) = config {
            fs::write(&paths.config, content).unwrap();
        }
        let mut resolver = ProfileResolver::with_paths(paths);
        resolver.load_profiles();
        (dir, resolver)
    }

    #[test]
    fn merges_credentials_and_config() {
        let (_dir, resolver) = load(
            Some("[dev]\naws_access_key_id=X\naws_secret_access_key=S\n"),
            Some("[profile dev]\nregion=us-west-2\n"),
        );
        assert_eq!(resolver.profiles().len(), 1);
        let dev = resolver.get_profile("dev").unwrap();
        assert_eq!(dev.access_key_id.as_deref(), Some("X"));
        assert_eq!(dev.secret_access_key.as_deref(), Some("S"));
        assert_eq!(dev.region.as_deref(), Some("us-west-2"));
    }

    #[test]
    fn config_default_section_maps_to_default() {
        let (_dir, resolver) = load(None, Some("[default]\nregion=eu-central-1\n"));
        let default = resolver.get_default_profile().unwrap();
        assert_eq!(default.name, "default");
        assert_eq!(default.region.as_deref(), Some("eu-central-1"));
    }

    #[test]
    fn config_creates_missing_profiles_without_credentials() {
        let (_dir, resolver) = load(
            Some("[a]\naws_access_key_id=A\n"),
            Some("[profile b]\nrole_arn=arn:aws:iam::1:role/x\nsource_profile=a\naws_access_key_id=IGNORED\n"),
        );
        let b = resolver.get_profile("b").unwrap();
        assert_eq!(b.role_arn.as_deref(), Some("arn:aws:iam::1:role/x"));
        assert_eq!(b.source_profile.as_deref(), Some("a"));
        assert!(b.access_key_id.is_none());
        let names: Vec<&str> = resolver.profiles().iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[test]
    fn config_overrides_credentials_region() {
        let (_dir, resolver) = load(
            Some("[x]\nregion=us-east-1\n"),
            Some("[profile x]\nregion=ap-south-1\n"),
        );
        assert_eq!(resolver.get_region_for_profile("x"), Some("ap-south-1"));
    }

    #[test]
    fn empty_config_region_keeps_credentials_region() {
        let (_dir, resolver) = load(
            Some("[x]\nregion=us-east-1\n"),
            Some("[profile x]\nregion=\n"),
        );
        assert_eq!(resolver.get_profile("x").unwrap().region.as_deref(), Some("us-east-1"));
        assert_eq!(resolver.get_region_for_profile("x"), Some("us-east-1"));
    }

    #[test]
    fn empty_source_region_is_unset() {
        let (_dir, resolver) = load(
            Some("[b]\nregion=\n"),
            Some("[profile a]\nsource_profile=b\n"),
        );
        assert_eq!(resolver.get_region_for_profile("a"), None);
        assert_eq!(resolver.get_region_for_profile("b"), None);
    }

    #[test]
    fn missing_files_yield_no_profiles() {
        let (_dir, resolver) = load(None, None);
        assert!(resolver.profiles().is_empty());
        assert!(resolver.get_default_profile().is_none());
        assert!(resolver.get_region_for_profile("anything").is_none());
    }

    #[test]
    fn unreadable_credentials_keep_config_profiles() {
        let dir = tempfile::tempdir().unwrap();
        let paths = ProfilePaths::in_dir(dir.path());
        // A directory where the file should be fails to read as text.
        fs::create_dir(&paths.credentials).unwrap();
        fs::write(&paths.config, "[profile ops]\nregion=sa-east-1\n").unwrap();

        let mut resolver = ProfileResolver::with_paths(paths);
        let profiles = resolver.load_profiles();
        assert_eq!(profiles.len(), 1);
        assert_eq!(profiles[0].name, "ops");
    }

    #[test]
    fn non_utf8_config_keeps_credentials_profiles() {
        let dir = tempfile::tempdir().unwrap();
        let paths = ProfilePaths::in_dir(dir.path());
        fs::write(&paths.credentials, "[main]\naws_access_key_id=K\n").unwrap();
        fs::write(&paths.config, b"\xff\xfe[profile x]\n").unwrap();

        let mut resolver = ProfileResolver::with_paths(paths);
        assert_eq!(resolver.load_profiles().len(), 1);
        assert_eq!(resolver.get_profile("main").unwrap().access_key_id.as_deref(), Some("K"));
    }

    #[test]
    fn comment_only_files_are_empty() {
        let (_dir, resolver) = load(Some("# nothing\n\n"), Some("; still nothing\n"));
        assert!(resolver.profiles().is_empty());
    }

    #[test]
    fn default_falls_back_to_first_profile() {
        let (_dir, resolver) = load(Some("[second]\n[first]\n"), None);
        assert_eq!(resolver.get_default_profile().unwrap().name, "second");

        let (_dir, resolver) = load(Some("[second]\n[default]\n"), None);
        assert_eq!(resolver.get_default_profile().unwrap().name, "default");
    }

    #[test]
    fn region_follows_exactly_one_source_hop() {
        let (_dir, resolver) = load(
            None,
            Some(
                "[profile a]\nsource_profile=b\n\
                 [profile b]\nregion=eu-west-1\n\
                 [profile c]\nsource_profile=d\n\
                 [profile d]\nsource_profile=e\n\
                 [profile e]\nregion=us-east-2\n",
            ),
        );
        assert_eq!(resolver.get_region_for_profile("a"), Some("eu-west-1"));
        assert_eq!(resolver.get_region_for_profile("b"), Some("eu-west-1"));
        assert_eq!(resolver.get_region_for_profile("c"), None);
        assert_eq!(resolver.get_region_for_profile("missing"), None);
    }

    #[test]
    fn reload_replaces_previous_profiles() {
        let (dir, mut resolver) = load(Some("[old]\n"), None);
        fs::write(dir.path().join("credentials"), "[new]\n").unwrap();
        resolver.load_profiles();
        assert!(resolver.get_profile("old").is_none());
        assert!(resolver.get_profile("new").is_some());
    }

    #[test]
    fn debug_and_json_hide_secrets() {
        let mut profile = Profile::new("p");
        profile.access_key_id = Some("AKIA".to_string());
        profile.secret_access_key = Some("very-secret".to_string());
        profile.session_token = Some("token-secret".to_string());

        let debug = format!("{:?}", profile);
        assert!(!debug.contains("very-secret"));
        assert!(!debug.contains("token-secret"));

        let json = serde_json::to_string(&profile).unwrap();
        assert_eq!(json, r#"{"name":"p","accessKeyId":"AKIA"}"#);
    }
}
