//! Default profile / region settings and the choice of which profile and
//! region to browse.

use crate::profiles::{ProfileResolver, DEFAULT_PROFILE};

pub const DEFAULT_REGION: &str = "us-east-1";

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    /// Profile used when none is requested explicitly.
    pub default_profile: String,
    /// Region used when neither the request nor the profile names one.
    pub default_region: String,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            default_profile: DEFAULT_PROFILE.to_string(),
            default_region: DEFAULT_REGION.to_string(),
        }
    }
}

/// Profile and region a gateway should be initialized with.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct Selection {
    pub profile: String,
    pub region: String,
}

#[derive(Debug, Fail, PartialEq)]
pub enum SelectionError {
    #[fail(display = "No AWS profiles found. Please configure AWS credentials in ~/.aws/credentials")]
    NoProfiles,
    #[fail(display = "AWS profile \"{}\" not found", _0)]
    UnknownProfile(String),
}

impl Settings {
    /// Picks the requested profile, else the configured default, else the
    /// first loaded one. The region is the requested one, else the profile's
    /// (see `ProfileResolver::get_region_for_profile`), else the default region.
    pub fn select(
        &self,
        resolver: &ProfileResolver,
        profile: Option<&str>,
        region: Option<&str>,
    ) -> Result<Selection, SelectionError> {
        let chosen = match profile {
            Some(name) => resolver
                .get_profile(name)
                .ok_or_else(|| SelectionError::UnknownProfile(name.to_string()))?,
            None => resolver
                .get_profile(&self.default_profile)
                .or_else(|| resolver.profiles().first())
                .ok_or(SelectionError::NoProfiles)?,
        };
        let region = region
            .filter(|r| !r.is_empty())
            .or_else(|| resolver.get_region_for_profile(&chosen.name))
            .filter(|r| !r.is_empty())
            .unwrap_or(self.default_region.as_str());

        Ok(Selection {
            profile: chosen.name.clone(),
            region: region.to_string(),
        })
    }
}
