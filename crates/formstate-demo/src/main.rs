//! formstate-demo CLI
//!
//! Builds one of the sample forms, applies scripted edits as a user would
//! (change, then blur), submits it and prints the outcome as JSON.

mod forms;

use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use formstate::{FieldError, Form, FormValues, Mode, PendingValidation, SetValueOptions};
use formstate_remote::{RemoteConfig, UserClient, DEFAULT_BASE_URL};
use serde_json::json;
use tracing::{debug, info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use crate::forms::Backend;

/// Drive sample forms from the command line.
#[derive(Parser)]
#[command(name = "formstate-demo")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// User service base URL.
    #[arg(long, env = "FORMSTATE_BASE_URL", default_value = DEFAULT_BASE_URL)]
    base_url: String,

    /// User whose record provides the registration defaults.
    #[arg(long, env = "FORMSTATE_USER_ID", default_value_t = 1)]
    user_id: u32,

    /// Use static defaults and skip remote checks.
    #[arg(long)]
    offline: bool,

    /// When fields are validated before the first submit.
    #[arg(long, value_enum, default_value_t = ModeArg::All)]
    mode: ModeArg,

    /// Request timeout in seconds.
    #[arg(long, env = "FORMSTATE_TIMEOUT_SECS", default_value_t = 10)]
    timeout_secs: u64,

    /// Enable verbose output.
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fill in and submit the channel registration form.
    Register {
        /// Field edit as `path=value` (e.g. `social.twitter=@batman`).
        #[arg(short, long = "set", value_parser = parse_edit)]
        edits: Vec<(String, String)>,
    },

    /// Fill in and submit the login form.
    Login {
        /// Field edit as `path=value`.
        #[arg(short, long = "set", value_parser = parse_edit)]
        edits: Vec<(String, String)>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum ModeArg {
    OnSubmit,
    OnChange,
    OnBlur,
    OnTouched,
    All,
}

impl From<ModeArg> for Mode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::OnSubmit => Self::OnSubmit,
            ModeArg::OnChange => Self::OnChange,
            ModeArg::OnBlur => Self::OnBlur,
            ModeArg::OnTouched => Self::OnTouched,
            ModeArg::All => Self::All,
        }
    }
}

fn parse_edit(s: &str) -> Result<(String, String), String> {
    let (path, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected `path=value`, got `{s}`"))?;
    formstate::FieldPath::parse(path).map_err(|e| e.to_string())?;
    Ok((path.to_string(), value.to_string()))
}

async fn settle(form: &mut Form, pending: Option<PendingValidation>) -> anyhow::Result<()> {
    if let Some(pending) = pending {
        let outcome = pending.resolve().await?;
        let applied = form.apply_validation(outcome);
        debug!(applied, "async validation settled");
    }
    Ok(())
}

async fn apply_edits(form: &mut Form, edits: &[(String, String)]) -> anyhow::Result<()> {
    for (path, value) in edits {
        let parsed = formstate::FieldPath::parse(path)?;
        if form.is_registered(&parsed) {
            let pending = form.change(&parsed, value.as_str())?;
            settle(form, pending).await?;
            let pending = form.blur(&parsed)?;
            settle(form, pending).await?;
        } else {
            let options = SetValueOptions {
                should_dirty: true,
                ..SetValueOptions::default()
            };
            let pending = form.set_value(&parsed, value.as_str(), options)?;
            settle(form, pending).await?;
        }
        debug!(%path, "applied edit");
    }
    Ok(())
}

async fn run(mut form: Form, edits: &[(String, String)]) -> anyhow::Result<serde_json::Value> {
    if !form.is_ready() {
        form.load_defaults()
            .await
            .context("failed to load default values")?;
    }

    apply_edits(&mut form, edits).await?;

    let mut submitted: Option<FormValues> = None;
    let mut rejected = Vec::new();
    let valid = form
        .handle_submit(
            |values| {
                submitted = Some(values);
                async {}
            },
            |errors| {
                rejected = errors
                    .iter()
                    .map(|(path, FieldError { message, .. })| format!("{path}: {message}"))
                    .collect();
            },
        )
        .await?;

    if valid {
        info!("form submitted");
    } else {
        for error in &rejected {
            warn!("{error}");
        }
    }

    Ok(json!({
        "valid": valid,
        "submitted": submitted.map(|values| values.to_json()),
        "errors": form.errors().to_tree(),
        "state": form.state(),
    }))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let mode = Mode::from(cli.mode);
    let (form, edits) = match &cli.command {
        Commands::Register { edits } => {
            let backend = if cli.offline {
                Backend::Offline
            } else {
                let config = RemoteConfig::new(&cli.base_url)
                    .timeout(Duration::from_secs(cli.timeout_secs));
                Backend::Remote {
                    client: UserClient::new(config)?,
                    user_id: cli.user_id,
                }
            };
            (forms::registration(mode, &backend)?, edits)
        }
        Commands::Login { edits } => (forms::login(mode)?, edits),
    };

    let report = run(form, edits).await?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_edit() {
        assert_eq!(
            parse_edit("social.twitter=@batman").unwrap(),
            ("social.twitter".to_string(), "@batman".to_string())
        );
        assert!(parse_edit("no-equals").is_err());
        assert!(parse_edit("social..twitter=x").is_err());
    }

    #[tokio::test]
    async fn test_apply_edits_rejects_far_index() {
        let mut form = forms::login(Mode::OnSubmit).unwrap();
        for path in ["tags.18446744073709551615", "tags.1000000000"] {
            let edits = [(path.to_string(), "x".to_string())];
            let err = apply_edits(&mut form, &edits).await.unwrap_err();
            assert!(matches!(
                err.downcast_ref::<formstate::FormError>(),
                Some(formstate::FormError::IndexOutOfBounds { .. })
            ));
        }
        assert!(form.values().get(&formstate::FieldPath::key("tags")).is_none());
    }
}
