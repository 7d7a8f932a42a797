//! Interactive terminal login.
//!
//! Drives a [`LoginFlow`] over stdin/stdout: each iteration renders any
//! pending error for the active screen, gathers the input that screen needs,
//! and feeds it to the flow. The loop ends when the flow resolves a
//! post-login destination. Security-key screens use the unavailable
//! authenticator (a terminal has no platform ceremony) and fall back to the
//! other offered methods.

use crate::api::ApiClient;
use crate::cli::actions::Action;
use crate::flow::{FactorKind, LoginFlow, Progress, Screen, OTP_CODE_LEN};
use crate::webauthn::UnavailableAuthenticator;
use anyhow::{bail, Context, Result};
use secrecy::SecretString;
use std::io::{self, BufRead, Write};

/// Handle the login action.
///
/// # Errors
/// Returns an error if the API client cannot be built or the terminal
/// streams fail. Authentication failures are not errors; they are re-prompts.
pub async fn handle(action: Action) -> Result<()> {
    let Action::Login {
        api_url,
        username,
        next,
    } = action;

    let client = ApiClient::new(&api_url)?;
    let mut flow = LoginFlow::new(client, next);

    let stdin = io::stdin();
    let mut input = stdin.lock();
    let mut preset_username = username;
    let mut last_code: Option<String> = None;

    loop {
        report(&flow);
        let progress = match flow.screen() {
            Screen::Welcome => {
                let username = match preset_username.take() {
                    Some(username) => username,
                    None => prompt(&mut input, "Username or email")?,
                };
                flow.submit_username(&username).await
            }
            Screen::LoginOptions => {
                let options = flow
                    .session()
                    .first_factor_options()
                    .unwrap_or_default()
                    .to_vec();
                match pick(&mut input, "Choose how to sign in", &options)? {
                    Some(kind) => flow.choose_first_factor(kind),
                    None => Progress::Stay,
                }
            }
            Screen::Password => {
                let label = format!("Password for {}", flow.session().username());
                let password = prompt(&mut input, &label)?;
                flow.submit_password(SecretString::from(password)).await
            }
            Screen::TwoFactorOptions => {
                let options = flow
                    .session()
                    .second_factor_options()
                    .unwrap_or_default()
                    .to_vec();
                match pick(&mut input, "Verify your identity with", &options)? {
                    Some(kind) => flow.choose_second_factor(kind),
                    None => Progress::Stay,
                }
            }
            Screen::Totp => {
                let code = prompt(&mut input, "One-time code")?;
                let changed = last_code.as_deref() != Some(code.as_str());
                last_code = Some(code.clone());
                let progress = if changed {
                    flow.totp_code_changed(&code).await
                } else {
                    // Enter on an unchanged value deliberately retries it.
                    flow.submit_totp_code().await
                };
                if progress == Progress::Stay
                    && flow.field_error().is_none()
                    && code.len() != OTP_CODE_LEN
                {
                    println!("The code has {OTP_CODE_LEN} digits.");
                }
                progress
            }
            Screen::RecoveryCode => {
                let code = prompt(&mut input, "Recovery code")?;
                flow.submit_recovery_code(&code).await
            }
            Screen::Webauthn => {
                let progress = flow.authenticate_security_key(&UnavailableAuthenticator).await;
                if progress == Progress::Stay {
                    report(&flow);
                    flow.more_options()
                } else {
                    progress
                }
            }
            Screen::WebauthnPasswordless => {
                let progress = flow.authenticate_security_key(&UnavailableAuthenticator).await;
                if progress == Progress::Stay {
                    report(&flow);
                    flow.back_to_first_factor_choice()
                } else {
                    progress
                }
            }
            Screen::Pgp => match flow.fetch_pgp_challenge().await {
                Some(challenge) => {
                    println!("Sign this challenge with your PGP key:");
                    println!("{challenge}");
                    let signature = prompt(&mut input, "Detached signature")?;
                    flow.submit_pgp_signature(&signature).await
                }
                None => {
                    report(&flow);
                    prompt(&mut input, "Press enter to retry")?;
                    Progress::Stay
                }
            },
        };

        if let Progress::Redirect(destination) = progress {
            println!("Signed in. Continue at {destination}");
            return Ok(());
        }
    }
}

fn report(flow: &LoginFlow) {
    if let Some(error) = flow.field_error() {
        eprintln!("{}", error.message);
    }
    if let Some(alert) = flow.alert() {
        eprintln!("{alert}");
    }
}

fn prompt(input: &mut impl BufRead, label: &str) -> Result<String> {
    print!("{label}: ");
    io::stdout().flush().context("failed to flush prompt")?;

    let mut line = String::new();
    let read = input
        .read_line(&mut line)
        .context("failed to read input")?;
    if read == 0 {
        bail!("input stream closed");
    }

    Ok(line.trim().to_string())
}

fn pick(
    input: &mut impl BufRead,
    title: &str,
    options: &[FactorKind],
) -> Result<Option<FactorKind>> {
    println!("{title}:");
    for (index, option) in options.iter().enumerate() {
        println!("  {}) {}", index + 1, option.title());
    }

    let choice = prompt(input, "Option")?;
    Ok(choice
        .parse::<usize>()
        .ok()
        .and_then(|number| number.checked_sub(1))
        .and_then(|index| options.get(index).copied()))
}
