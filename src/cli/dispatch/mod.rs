use crate::cli::actions::Action;
use anyhow::{Context, Result};

/// # Errors
/// Returns an error if required arguments are missing or inconsistent.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    let api_url = matches
        .get_one::<String>("api-url")
        .cloned()
        .context("missing required argument: --api-url")?;

    Ok(Action::Login {
        api_url,
        username: matches.get_one::<String>("username").cloned(),
        next: matches.get_one::<String>("next").cloned(),
    })
}
