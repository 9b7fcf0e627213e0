use clap::{Parser, Subcommand};
use color_eyre::eyre::WrapErr;
use color_eyre::Result;
use env_logger::Env;
use log::{error, info};
use std::path::PathBuf;

use feature_registry::config::{self, Settings};
use feature_registry::error::AggregateError;
use feature_registry::record::Component;
use feature_registry::registry::{FeatureRegistry, GenerateRequest};
use feature_registry::utils::resolve_branch_name;

/// Manage feature branch deployment records in this repository
#[derive(Parser, Debug)]
#[command(name = "feature-registry", author, version, about, long_about = None)]
#[command(arg_required_else_help = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Directory holding the feature records [default: feature]
    #[arg(long, global = true)]
    feature_dir: Option<PathBuf>,

    /// Path to a YAML settings file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, default_value = "info")]
    log_level: String,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create or update the record for a branch
    Generate {
        /// The branch name being deployed [default: $CIRCLE_BRANCH]
        #[arg(long)]
        branch: Option<String>,

        /// The tag to use for the appserver [default: main]
        #[arg(long)]
        appserver_tag: Option<String>,

        /// The tag to use for the ui [default: main]
        #[arg(long)]
        ui_tag: Option<String>,

        /// The component being updated (appserver|ui); required when the record exists
        #[arg(long)]
        component: Option<Component>,
    },

    /// Delete the oldest records beyond the retention limit
    Prune {
        /// The maximum number of feature branches to keep [default: 6]
        #[arg(long)]
        max_features: Option<usize>,
    },
}

fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();

    env_logger::Builder::from_env(Env::default().default_filter_or(&cli.log_level)).init();

    let settings = config::load_settings_or_default(cli.config.as_deref())?;
    let registry = FeatureRegistry::new(
        cli.feature_dir.clone().unwrap_or_else(|| settings.feature_dir.clone()),
    );
    info!("Feature directory: {:?}", registry.dir());

    match cli.command {
        Commands::Generate {
            branch,
            appserver_tag,
            ui_tag,
            component,
        } => {
            let request = GenerateRequest {
                branch_name: resolve_branch_name(branch.as_deref())?,
                appserver_tag: appserver_tag
                    .unwrap_or_else(|| settings.default_appserver_tag.clone()),
                ui_tag: ui_tag.unwrap_or_else(|| settings.default_ui_tag.clone()),
                component,
            };
            run_generate(&registry, &request)
        }
        Commands::Prune { max_features } => run_prune(&registry, &settings, max_features),
    }
}

fn run_generate(registry: &FeatureRegistry, request: &GenerateRequest) -> Result<()> {
    let record = registry.generate(request).wrap_err_with(|| {
        format!("Failed to generate record for branch '{}'", request.branch_name)
    })?;

    info!("Wrote feature record {:?}", registry.record_path(&record.identifier));
    Ok(())
}

fn run_prune(
    registry: &FeatureRegistry,
    settings: &Settings,
    max_features: Option<usize>,
) -> Result<()> {
    let max_features = max_features.unwrap_or(settings.max_features);
    info!("Pruning feature records, max features: {}", max_features);

    // A record that fails to parse would not count toward the limit, so stop here
    let records = registry
        .list_all()
        .into_result()
        .inspect_err(log_failures)
        .wrap_err("Failed to read feature records")?;

    let report = registry
        .prune(records, max_features)
        .into_result()
        .inspect_err(log_failures)
        .wrap_err("Failed to delete feature records")?;

    info!(
        "Prune complete: kept {}, removed {}",
        report.kept.len(),
        report.removed.len()
    );
    Ok(())
}

fn log_failures(aggregate: &AggregateError) {
    for failure in aggregate.errors() {
        error!("{}", failure);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use feature_registry::record::FeatureRecord;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_generate_parsing() {
        let cli = Cli::parse_from([
            "feature-registry",
            "generate",
            "--branch",
            "feature/login",
            "--ui-tag",
            "ui-7",
            "--component",
            "ui",
        ]);

        match cli.command {
            Commands::Generate {
                branch,
                appserver_tag,
                ui_tag,
                component,
            } => {
                assert_eq!(branch.as_deref(), Some("feature/login"));
                assert_eq!(appserver_tag, None);
                assert_eq!(ui_tag.as_deref(), Some("ui-7"));
                assert_eq!(component, Some(Component::Ui));
            }
            other => panic!("unexpected command {:?}", other),
        }
        assert_eq!(cli.log_level, "info");
        assert_eq!(cli.feature_dir, None);
    }

    #[test]
    fn test_prune_parsing() {
        let cli = Cli::parse_from([
            "feature-registry",
            "prune",
            "--max-features",
            "2",
            "--feature-dir",
            "deploy/feature",
        ]);

        assert!(matches!(cli.command, Commands::Prune { max_features: Some(2) }));
        assert_eq!(cli.feature_dir, Some(PathBuf::from("deploy/feature")));
    }

    #[test]
    fn test_invalid_invocations_are_rejected() {
        assert!(Cli::try_parse_from(["feature-registry"]).is_err());
        assert!(Cli::try_parse_from(["feature-registry", "deploy"]).is_err());
        let bad_component = ["feature-registry", "generate", "--component", "db"];
        assert!(Cli::try_parse_from(bad_component).is_err());
        let negative_limit = ["feature-registry", "prune", "--max-features", "-1"];
        assert!(Cli::try_parse_from(negative_limit).is_err());
    }

    fn seed_records(registry: &FeatureRegistry, identifiers: &[&str]) {
        for (month, identifier) in (1..).zip(identifiers) {
            let deployed = Utc.with_ymd_and_hms(2024, month, 1, 0, 0, 0).unwrap();
            registry
                .write(&FeatureRecord::new(*identifier, "main", "main", deployed))
                .unwrap();
        }
    }

    #[test]
    fn test_prune_aborts_when_a_record_is_corrupt() {
        let dir = TempDir::new().unwrap();
        let registry = FeatureRegistry::new(dir.path());
        seed_records(&registry, &["a", "b", "c", "d"]);
        fs::write(dir.path().join("broken.json"), "{ \"identifier\": ").unwrap();

        let result = run_prune(&registry, &Settings::default(), Some(2));

        assert!(result.is_err());
        for identifier in ["a", "b", "c", "d"] {
            assert!(registry.record_path(identifier).exists(), "{} was deleted", identifier);
        }
    }

    #[test]
    fn test_prune_uses_settings_limit() {
        let dir = TempDir::new().unwrap();
        let registry = FeatureRegistry::new(dir.path());
        seed_records(&registry, &["a", "b", "c"]);
        let settings = Settings {
            max_features: 2,
            ..Settings::default()
        };

        run_prune(&registry, &settings, None).unwrap();

        assert!(!registry.record_path("a").exists());
        assert!(registry.record_path("b").exists());
        assert!(registry.record_path("c").exists());
    }
}
