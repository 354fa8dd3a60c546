//! Command-line argument dispatch and server initialization.
//!
//! Parses validated CLI arguments and maps them to the appropriate action,
//! such as starting the gateway with its full configuration state.

use crate::cli::{
    actions::{server::Args, Action},
    commands,
    globals::GlobalArgs,
};
use anyhow::{Context, Result};
use secrecy::SecretString;
use url::Url;

/// Map validated CLI matches to a server action.
///
/// # Errors
/// Returns an error if required arguments are missing or inconsistent.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    let port = matches
        .get_one::<u16>(commands::ARG_PORT)
        .copied()
        .unwrap_or(8080);

    let api_url = matches
        .get_one::<String>(commands::ARG_API_URL)
        .cloned()
        .context("missing required argument: --api-url")?;
    Url::parse(&api_url).context("invalid ARISE_API_URL")?;

    let jwt_access_secret = matches
        .get_one::<String>(commands::ARG_JWT_ACCESS_SECRET)
        .cloned()
        .context("missing required argument: --jwt-access-secret")?;

    let secure_cookies = matches.get_flag(commands::ARG_SECURE_COOKIES);

    Ok(Action::Server(Args {
        port,
        globals: GlobalArgs::new(api_url, SecretString::from(jwt_access_secret), secure_cookies),
    }))
}
