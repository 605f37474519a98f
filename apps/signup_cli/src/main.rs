use std::{fs, path::Path, sync::Arc, time::Duration};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use signup_core::{
    transport::HttpSignupBackend, validate_sign_in, ErrorReport, FormField, SubmissionController,
    SubmissionEvent, SubmitOutcome, ValidationPolicy, ValidationRuleSet,
};
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;
use url::Url;

#[derive(Parser, Debug)]
struct Args {
    #[arg(long, default_value = "http://127.0.0.1:3000")]
    server_url: Url,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create an account.
    SignUp {
        #[arg(long)]
        first_name: String,
        #[arg(long)]
        last_name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
        /// Defaults to the value of --password.
        #[arg(long)]
        confirm_password: Option<String>,
        #[arg(long)]
        accept_terms: bool,
        /// TOML file overriding the validation policy.
        #[arg(long)]
        policy: Option<std::path::PathBuf>,
        #[arg(long, default_value_t = 10)]
        timeout_secs: u64,
    },
    SignIn {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .init();
    let args = Args::parse();
    let backend = Arc::new(HttpSignupBackend::new(args.server_url.as_str()));

    match args.command {
        Command::SignUp {
            first_name,
            last_name,
            email,
            password,
            confirm_password,
            accept_terms,
            policy,
            timeout_secs,
        } => {
            let policy = load_policy(policy.as_deref())?;
            let controller = SubmissionController::new(
                Arc::new(ValidationRuleSet::new(&policy)),
                backend.clone(),
                backend,
            )
            .with_call_timeout(Duration::from_secs(timeout_secs));

            let mut events = controller.subscribe_events();
            let logger = tokio::spawn(async move {
                loop {
                    match events.recv().await {
                        Ok(SubmissionEvent::StateChanged(state)) => debug!(?state, "state"),
                        Ok(event) => debug!(?event, "submission event"),
                        Err(RecvError::Lagged(skipped)) => debug!(skipped, "event log lagged"),
                        Err(RecvError::Closed) => break,
                    }
                }
            });

            let confirm_password = confirm_password.unwrap_or_else(|| password.clone());
            for (field, value) in [
                (FormField::FirstName, first_name),
                (FormField::LastName, last_name),
                (FormField::Email, email),
                (FormField::Password, password),
                (FormField::ConfirmPassword, confirm_password),
            ] {
                controller.on_field_change(field, value).await?;
            }
            controller
                .on_field_change(FormField::AcceptTerms, accept_terms)
                .await?;

            let outcome = controller.on_submit().await?;
            drop(controller);
            let _ = logger.await;

            match outcome {
                SubmitOutcome::Succeeded => {
                    info!("sign-up complete");
                    println!("Account created.");
                }
                SubmitOutcome::Failed(report) => {
                    for line in render_report(&report) {
                        eprintln!("{line}");
                    }
                    bail!("sign-up failed");
                }
            }
        }
        Command::SignIn { email, password } => {
            let report = validate_sign_in(&email, &password);
            if !report.is_empty() {
                for line in render_report(&report) {
                    eprintln!("{line}");
                }
                bail!("sign-in failed");
            }

            let response = backend.sign_in(&email, &password).await?;
            match (response.success, response.user) {
                (true, Some(user)) => println!(
                    "Signed in as {} {} <{}>",
                    user.first_name, user.last_name, user.email
                ),
                (true, None) => println!("Signed in."),
                (false, _) => {
                    bail!(response
                        .error
                        .unwrap_or_else(|| "Invalid email or password".to_string()))
                }
            }
        }
    }

    Ok(())
}

fn load_policy(path: Option<&Path>) -> Result<ValidationPolicy> {
    let Some(path) = path else {
        return Ok(ValidationPolicy::default());
    };
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read policy file {}", path.display()))?;
    toml::from_str(&raw).with_context(|| format!("invalid policy file {}", path.display()))
}

fn render_report(report: &ErrorReport) -> Vec<String> {
    report
        .iter()
        .map(|(key, message)| format!("{key}: {message}"))
        .collect()
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;
