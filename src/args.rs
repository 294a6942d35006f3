use structopt::StructOpt;

use ssm_explorer::ParameterType;

#[derive(StructOpt, Debug)]
#[structopt(name = "ssm_explorer",
    about = "SSM Explorer - Browse, create, edit and delete AWS SSM Parameters per local AWS profile."
)]
pub struct Opt {
    /// AWS Profile, defaults to --default-profile
    #[structopt(short = "p", long = "profile", env = "AWS_PROFILE")]
    pub profile: Option<String>,
    /// AWS Region, defaults to the profile's region, then --default-region
    #[structopt(short = "r", long = "region", env = "AWS_REGION")]
    pub region: Option<String>,
    /// Profile used when --profile is not given
    #[structopt(long = "default-profile", env = "SSM_EXPLORER_DEFAULT_PROFILE", default_value = "default")]
    pub default_profile: String,
    /// Region used when neither --region nor the profile sets one
    #[structopt(long = "default-region", env = "SSM_EXPLORER_DEFAULT_REGION", default_value = "us-east-1")]
    pub default_region: String,
    /// Quiet Mode => Only Errors and Command Output
    #[structopt(short = "q", long = "quiet")]
    pub quiet: bool,
    #[structopt(subcommand)]
    pub cmd: Command,
}

#[derive(StructOpt, Debug)]
pub enum Command {
    /// List AWS Profiles found in ~/.aws/credentials and ~/.aws/config
    #[structopt(name = "profiles", visible_alias = "pr")]
    Profiles,
    /// List Known AWS Regions
    #[structopt(name = "regions")]
    Regions,
    /// List Parameter Metadata (never values)
    #[structopt(name = "list", visible_alias = "la")]
    List {
        /// Only Parameters under this Path
        path: Option<String>,
        /// Do not descend below the first level of <path>
        #[structopt(long = "one-level")]
        one_level: bool,
    },
    /// Get Parameter by Name
    #[structopt(name = "get", visible_alias = "g")]
    Get {
        /// Parameter Name
        name: String,
        /// Decrypt SecureString Value
        #[structopt(short = "d", long = "decrypt")]
        decrypt: bool,
    },
    /// Create or Update a Parameter
    #[structopt(name = "put", visible_alias = "p")]
    Put {
        /// Parameter Name
        name: String,
        /// Parameter Value
        value: String,
        /// String, StringList or SecureString
        #[structopt(short = "t", long = "type", default_value = "String")]
        p_type: ParameterType,
        /// Parameter Description
        #[structopt(long = "description")]
        description: Option<String>,
        /// Overwrite Existing Parameter
        #[structopt(short = "o", long = "overwrite")]
        overwrite: bool,
    },
    /// Delete a Parameter
    #[structopt(name = "delete", visible_alias = "rm")]
    Delete {
        /// Parameter Name
        name: String,
        /// Confirm Deletion
        #[structopt(short = "y", long = "yes")]
        yes: bool,
    },
}
