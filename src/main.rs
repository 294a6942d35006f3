use std::process;

use failure::{bail, format_err, Error};
use structopt::StructOpt;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use ssm_explorer::regions::{is_known_region, KNOWN_REGIONS};
use ssm_explorer::{ProfileResolver, SSMError, SSMOps, Settings};

use args::*;

mod args;

/// SSM Explorer
/// Command Line
/// --profile, -p => AWS profile to use
/// --region, -r => AWS region to use
/// --quiet, -q => Only errors and command output
/// profiles, pr => List local AWS profiles
/// regions => List known AWS regions
/// list, la [PATH] [--one-level] => List parameter metadata, sorted by name
/// get, g NAME [--decrypt] => Get one parameter
/// put, p NAME VALUE [--type T] [--description D] [--overwrite] => Create or update a parameter
/// delete, rm NAME --yes => Delete a parameter
fn main() {
    let clap_options = Opt::clap().get_matches_safe();

    // Will exit with error code 1 even for VersionDisplayed and HelpDisplayed
    let clap_options = match clap_options {
        Ok(matches) => matches,
        Err(err) => {
            println!("{}", err.message);
            process::exit(1)
        }
    };

    let options = Opt::from_clap(&clap_options);
    init_logging(options.quiet);

    if let Err(err) = run(options) {
        if let Some(kind) = err.downcast_ref::<SSMError>().and_then(SSMError::remote_kind) {
            eprintln!("{}", kind.hint());
        }
        eprintln!("{}", err);
        process::exit(1)
    }
}

fn init_logging(quiet: bool) {
    let default_filter = if quiet { "warn" } else { "ssm_explorer=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(options: Opt) -> Result<(), Error> {
    let mut resolver = ProfileResolver::new();
    resolver.load_profiles();

    match options.cmd {
        Command::Profiles => {
            if resolver.profiles().is_empty() {
                warn!(paths = ?resolver.paths(), "no AWS profiles found");
            }
            for profile in resolver.profiles() {
                println!("{}", serde_json::to_string(profile)?);
            }
            return Ok(());
        }
        Command::Regions => {
            KNOWN_REGIONS.iter().for_each(|r| println!("{}", r));
            return Ok(());
        }
        _ => {}
    }

    let settings = Settings {
        default_profile: options.default_profile.clone(),
        default_region: options.default_region.clone(),
    };
    let selection = settings.select(
        &resolver,
        options.profile.as_deref(),
        options.region.as_deref(),
    )?;
    if !is_known_region(&selection.region) {
        warn!(region = %selection.region, "region is not in the known regions list");
    }

    let mut ssm = SSMOps::new();
    ssm.initialize(&selection.profile, &selection.region)?;

    match options.cmd {
        Command::List { path, one_level } => {
            let parameters = ssm.get_parameters(path.as_deref(), !one_level)?;
            if parameters.is_empty() {
                info!("no parameters found");
            }
            for p in parameters {
                println!("{}", serde_json::to_string(&p)?);
            }
        }
        Command::Get { name, decrypt } => {
            let parameter = ssm
                .get_parameter(&name, decrypt)?
                .ok_or_else(|| format_err!("Parameter '{}' not found", name))?;
            if parameter.p_type.is_secure() && !decrypt {
                info!(name = %name, "SecureString value withheld, pass --decrypt to decrypt it");
            }
            println!("{}", serde_json::to_string(&parameter)?);
        }
        Command::Put {
            name,
            value,
            p_type,
            description,
            overwrite,
        } => {
            ssm.put_parameter(&name, &value, p_type, description.as_deref(), overwrite)?;
        }
        Command::Delete { name, yes } => {
            if !yes {
                bail!("Refusing to delete parameter '{}' without --yes", name);
            }
            ssm.delete_parameter(&name)?;
        }
        Command::Profiles | Command::Regions => {}
    }
    Ok(())
}
