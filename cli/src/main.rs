mod prompt;
mod render;

use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use common::{
    parse_source_document, AadGroup, AppRegistration, Config, DuplicateNamePolicy,
    MembershipRecord,
};
use engine::output::{read_json, write_ledger, write_report, write_source_documents};
use engine::{
    fetch_report, validate_memberships, AutoApprove, CdfClient, Ledger, Reconciler, RunAborted,
    SourceDocuments,
};
use log::{error, info, warn};

use crate::prompt::ConsoleConfirm;

#[derive(Parser, Debug)]
#[command(name = "cdf-iam", version, about = "Reconcile CDF access groups with Azure AD")]
struct Cli {
    /// Path to the TOML config file
    #[arg(long, global = true)]
    config: Option<String>,

    /// CDF cluster prefix, e.g. `westeurope-1`
    #[arg(long = "cdf-cluster", global = true)]
    cdf_cluster: Option<String>,

    #[arg(long = "cognite-project", global = true)]
    cognite_project: Option<String>,

    #[arg(long = "cognite-apikey", global = true)]
    cognite_apikey: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create, verify or re-link CDF groups from the Azure AD export
    Reconcile {
        /// Approve every change without prompting
        #[arg(long, value_parser = parse_bool)]
        batch: Option<bool>,

        /// Desired-groups document, overrides `paths.groups_source`
        #[arg(long)]
        source: Option<String>,

        /// `last-wins` or `reject-ambiguous`
        #[arg(long = "duplicate-names", value_parser = parse_policy)]
        duplicate_names: Option<DuplicateNamePolicy>,
    },
    /// Export the IAM report and the Azure AD provisioning documents
    Report,
    /// Check the membership file against the exported groups and apps
    Validate,
}

fn parse_bool(value: &str) -> Result<bool, String> {
    match value.to_ascii_lowercase().as_str() {
        "yes" | "true" | "t" | "y" | "1" => Ok(true),
        "no" | "false" | "f" | "n" | "0" => Ok(false),
        _ => Err(format!("boolean value expected, got '{}'", value)),
    }
}

fn parse_policy(value: &str) -> Result<DuplicateNamePolicy, String> {
    match value {
        "last-wins" => Ok(DuplicateNamePolicy::LastWins),
        "reject-ambiguous" => Ok(DuplicateNamePolicy::RejectAmbiguous),
        _ => Err(format!("expected 'last-wins' or 'reject-ambiguous', got '{}'", value)),
    }
}

/// An explicitly given config file must exist; the default one may be absent.
fn read_config(path: &str, explicit: bool) -> Result<Config> {
    match Config::load_optional(path)? {
        Some(config) => {
            info!("Config loaded from {}", path);
            Ok(config)
        }
        None if explicit => bail!("config file {} not found", path),
        None => {
            info!("No config file at {}, using defaults", path);
            Ok(Config::default())
        }
    }
}

fn load_config(cli: &Cli) -> Result<Config> {
    let path = cli.config.clone().unwrap_or_else(Config::default_path);
    let mut config = read_config(&path, cli.config.is_some())?;

    config.apply_env();
    if let Some(cluster) = &cli.cdf_cluster {
        config.cdf.cluster = cluster.clone();
    }
    if let Some(project) = &cli.cognite_project {
        config.cdf.project = Some(project.clone());
    }
    if let Some(key) = &cli.cognite_apikey {
        config.cdf.api_key = Some(key.clone());
    }
    if let Command::Reconcile {
        batch,
        duplicate_names,
        ..
    } = &cli.command
    {
        if let Some(batch) = batch {
            config.reconcile.batch = *batch;
        }
        if let Some(policy) = duplicate_names {
            config.reconcile.duplicate_names = *policy;
        }
    }
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let config = load_config(&cli)?;

    match &cli.command {
        Command::Reconcile { source, .. } => run_reconcile(&config, source.as_deref()).await,
        Command::Report => run_report(&config).await,
        Command::Validate => run_validate(&config),
    }
}

async fn run_reconcile(config: &Config, source: Option<&str>) -> Result<()> {
    let path = source.unwrap_or(&config.paths.groups_source);
    let content = fs::read_to_string(path).with_context(|| format!("reading {}", path))?;
    let desired = parse_source_document(&content).with_context(|| format!("parsing {}", path))?;
    info!("Loaded {} desired groups from {}", desired.len(), path);

    let client = CdfClient::new(&config.cdf)?;
    info!(
        "Reconciling against project {} ({} mode)",
        client.project(),
        if config.reconcile.batch { "batch" } else { "interactive" }
    );

    let outcome = if config.reconcile.batch {
        let mut confirm = AutoApprove;
        let mut reconciler = Reconciler::new(&client, &mut confirm, &config.reconcile);
        reconciler.run(desired).await
    } else {
        let mut confirm = ConsoleConfirm;
        let mut reconciler = Reconciler::new(&client, &mut confirm, &config.reconcile);
        reconciler.run(desired).await
    };

    finish_run(Path::new(&config.paths.report_dir), outcome)
}

/// Writes the ledger of a finished or aborted run, then reports the abort.
fn finish_run(report_dir: &Path, outcome: Result<Ledger, RunAborted>) -> Result<()> {
    let (ledger, failure) = match outcome {
        Ok(ledger) => (ledger, None),
        Err(RunAborted { ledger, source }) => (ledger, Some(source)),
    };
    if let Some(err) = &failure {
        error!("Run aborted after {} recorded group(s): {:#}", ledger.len(), err);
    }

    let written = match write_ledger(report_dir, &ledger, Utc::now()) {
        Ok(path) => path,
        Err(e) => {
            return Err(match failure {
                Some(cause) => e.context(format!("writing ledger after aborted run: {:#}", cause)),
                None => e,
            });
        }
    };
    render::ledger_summary(&ledger, &written);

    match failure {
        Some(err) => Err(err.context(format!(
            "reconciliation aborted after {} recorded group(s)",
            ledger.len()
        ))),
        None => Ok(()),
    }
}

async fn run_report(config: &Config) -> Result<()> {
    let client = CdfClient::new(&config.cdf)?;
    let report = fetch_report(&client).await?;

    let mut written = write_report(Path::new(&config.paths.iam_dir), &report)?;
    let docs = SourceDocuments::from_report(&report);
    written.extend(write_source_documents(Path::new(&config.paths.source_dir), &docs)?);

    render::report_summary(&report, &written);
    Ok(())
}

fn run_validate(config: &Config) -> Result<()> {
    let source_dir = Path::new(&config.paths.source_dir);
    let groups: Vec<AadGroup> = read_json(&source_dir.join("AAD_Groups.json"))?;
    let apps: Vec<AppRegistration> = read_json(&source_dir.join("APP_Registrations.json"))?;
    let memberships: Vec<MembershipRecord> = read_json(Path::new(&config.paths.memberships))?;

    if memberships.is_empty() {
        warn!("{} holds no membership records", config.paths.memberships);
    }
    if memberships
        .iter()
        .any(|m| m.service_principal.is_none() && m.user.is_none())
    {
        bail!(
            "{} has a record with neither a service principal nor a user",
            config.paths.memberships
        );
    }

    let result = validate_memberships(&groups, &apps, &memberships);
    render::validation(&result);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_bool() {
        for yes in ["yes", "True", "t", "Y", "1"] {
            assert_eq!(parse_bool(yes), Ok(true));
        }
        for no in ["no", "FALSE", "f", "n", "0"] {
            assert_eq!(parse_bool(no), Ok(false));
        }
        assert!(parse_bool("maybe").is_err());
    }

    #[test]
    fn test_reconcile_flags() {
        let cli = Cli::try_parse_from([
            "cdf-iam",
            "--cognite-project",
            "demo",
            "reconcile",
            "--batch",
            "yes",
            "--duplicate-names",
            "reject-ambiguous",
        ])
        .unwrap();
        assert_eq!(cli.cognite_project.as_deref(), Some("demo"));
        match cli.command {
            Command::Reconcile {
                batch,
                duplicate_names,
                source,
            } => {
                assert_eq!(batch, Some(true));
                assert_eq!(duplicate_names, Some(DuplicateNamePolicy::RejectAmbiguous));
                assert!(source.is_none());
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_missing_default_config_falls_back() {
        let config = read_config("./does/not/exist.toml", false).unwrap();
        assert!(!config.reconcile.batch);
    }

    #[test]
    fn test_missing_explicit_config_fails() {
        assert!(read_config("./does/not/exist.toml", true).is_err());
    }

    #[test]
    fn test_aborted_run_writes_ledger_and_fails() {
        let dir = tempfile::tempdir().unwrap();
        let aborted = RunAborted {
            ledger: Ledger::new(),
            source: anyhow::anyhow!("create failed"),
        };

        let err = finish_run(dir.path(), Err(aborted)).unwrap_err();
        assert!(format!("{:#}", err).contains("create failed"));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_ledger_write_failure_keeps_run_failure() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("not-a-dir");
        std::fs::write(&blocker, "").unwrap();
        let aborted = RunAborted {
            ledger: Ledger::new(),
            source: anyhow::anyhow!("create failed"),
        };

        let err = finish_run(&blocker, Err(aborted)).unwrap_err();
        let message = format!("{:#}", err);
        assert!(message.contains("create failed"), "{}", message);
        assert!(message.contains("writing ledger after aborted run"), "{}", message);
    }

    #[test]
    fn test_bad_batch_value_is_rejected() {
        let parsed = Cli::try_parse_from(["cdf-iam", "reconcile", "--batch", "perhaps"]);
        assert!(parsed.is_err());
    }
}
