//! covreg - coverage report registry CLI
//!
//! ## Commands
//!
//! - `keys`: Print the coverage property keys for a language
//! - `languages`: List registered languages
//! - `collect`: Run the sensors over a settings file and print the sealed report sets

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use covreg_core::{ConfigurationTable, EmptyReportPolicy, ModuleKey, TestScope};
use covreg_sensors::{sensors_for, AnalysisRun, Module, RunReport, Settings};
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, Level};

#[derive(Parser)]
#[command(name = "covreg")]
#[command(author = "Stevedores Org")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Multi-source coverage report registry", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json: bool,

    /// TOML file with `[[language]]` entries replacing the built-in table
    #[arg(long, global = true, env = "COVREG_LANGUAGES")]
    languages_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the coverage report property keys for a language
    Keys {
        /// Language key (e.g. vbnet)
        #[arg(short, long)]
        language: String,

        /// Only this scope (unit | integration); both when omitted
        #[arg(short, long)]
        scope: Option<TestScope>,
    },

    /// List registered languages
    Languages,

    /// Run the sensors for one module and print the report sets as JSON
    Collect {
        /// Settings file with a `[properties]` table
        #[arg(short, long)]
        settings: PathBuf,

        /// Module base directory (default: current directory)
        #[arg(short, long)]
        base: Option<PathBuf>,

        /// Module key used to tag contributed paths
        #[arg(short, long, default_value = "root")]
        module: String,

        /// Language key (e.g. vbnet)
        #[arg(short, long)]
        language: String,

        /// Fail when a scope has no reports at all
        #[arg(long)]
        strict: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    covreg_core::init_tracing(cli.json, level);

    let table = Arc::new(load_table(cli.languages_file.as_deref())?);

    let output = match cli.command {
        Commands::Keys { language, scope } => keys(&table, &language, scope)?,
        Commands::Languages => languages(&table),
        Commands::Collect {
            settings,
            base,
            module,
            language,
            strict,
        } => {
            let base = resolve_base(base)?;
            let report = collect(table, &settings, &base, &module, &language, strict).await?;
            let failed: Vec<String> = report
                .failed_sensors()
                .map(|s| format!("{} on {}", s.sensor, s.module))
                .collect();
            if !failed.is_empty() {
                bail!("sensors failed: {}", failed.join(", "));
            }
            serde_json::to_value(&report).context("Failed to serialize run report")?
        }
    };

    println!(
        "{}",
        serde_json::to_string_pretty(&output).context("Failed to render output")?
    );
    Ok(())
}

fn load_table(path: Option<&Path>) -> Result<ConfigurationTable> {
    match path {
        Some(path) => ConfigurationTable::load(path)
            .with_context(|| format!("Failed to load languages from {}", path.display())),
        None => Ok(ConfigurationTable::builtin()),
    }
}

fn resolve_base(base: Option<PathBuf>) -> Result<PathBuf> {
    let cwd = std::env::current_dir().context("Failed to read current directory")?;
    Ok(match base {
        Some(base) if base.is_absolute() => base,
        Some(base) => cwd.join(base),
        None => cwd,
    })
}

fn keys(table: &ConfigurationTable, language: &str, scope: Option<TestScope>) -> Result<Value> {
    let info = table
        .language(language)
        .with_context(|| format!("Unknown language '{language}'"))?;
    let scopes = match scope {
        Some(scope) => vec![scope],
        None => TestScope::ALL.to_vec(),
    };

    let mut coverage = serde_json::Map::new();
    for scope in scopes {
        let keys = table.resolve_keys(language, scope)?;
        coverage.insert(
            scope.to_string(),
            serde_json::to_value(keys).context("Failed to serialize keys")?,
        );
    }

    Ok(json!({
        "language": info.key,
        "name": info.name,
        "coverage": coverage,
        "analyzer": {
            "project_out_paths": info.project_out_paths_key(),
            "roslyn_report_paths": info.roslyn_report_paths_key(),
        },
    }))
}

fn languages(table: &ConfigurationTable) -> Value {
    Value::Array(
        table
            .languages()
            .map(|info| json!({ "key": info.key, "name": info.name }))
            .collect(),
    )
}

async fn collect(
    table: Arc<ConfigurationTable>,
    settings_path: &Path,
    base: &Path,
    module: &str,
    language: &str,
    strict: bool,
) -> Result<RunReport> {
    let settings = Settings::load(settings_path)
        .with_context(|| format!("Failed to load settings from {}", settings_path.display()))?;
    let sensors = sensors_for(&table, language)
        .with_context(|| format!("Unknown language '{language}'"))?;
    let policy = if strict {
        EmptyReportPolicy::Strict
    } else {
        EmptyReportPolicy::Lenient
    };

    let module = Module::new(ModuleKey::new(module), base, settings).with_language(language);
    let mut run = AnalysisRun::new(table).with_policy(policy);
    info!(run_id = %run.run_id(), language = %language, "collecting report paths");
    run.execute(&[module], &sensors).await;

    run.finish(&[language]).context("Failed to build report sets")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keys_both_scopes() {
        let table = ConfigurationTable::builtin();
        let value = keys(&table, "vbnet", None).unwrap();
        assert_eq!(value["name"], "VB.NET");
        assert_eq!(
            value["coverage"]["unit"]["opencover"],
            "sonar.vbnet.opencover.reportsPaths"
        );
        assert_eq!(
            value["coverage"]["integration"]["opencover"],
            "sonar.vbnet.opencover.it.reportsPaths"
        );
        assert_eq!(
            value["analyzer"]["project_out_paths"],
            "sonar.vbnet.analyzer.projectOutPaths"
        );
    }

    #[test]
    fn test_keys_single_scope() {
        let table = ConfigurationTable::builtin();
        let value = keys(&table, "cs", Some(TestScope::Integration)).unwrap();
        assert!(value["coverage"].get("unit").is_none());
        assert!(value["coverage"].get("integration").is_some());
    }

    #[test]
    fn test_keys_unknown_language() {
        let table = ConfigurationTable::builtin();
        assert!(keys(&table, "cobol", None).is_err());
    }

    #[test]
    fn test_languages_lists_builtin() {
        let value = languages(&ConfigurationTable::builtin());
        let keys: Vec<&str> = value
            .as_array()
            .unwrap()
            .iter()
            .map(|l| l["key"].as_str().unwrap())
            .collect();
        assert!(keys.contains(&"vbnet"));
        assert!(keys.contains(&"cs"));
    }

    #[test]
    fn test_cli_parses_collect() {
        let cli = Cli::try_parse_from([
            "covreg",
            "--verbose",
            "collect",
            "--settings",
            "s.toml",
            "--language",
            "vbnet",
            "--strict",
        ])
        .unwrap();
        assert!(cli.verbose);
        match cli.command {
            Commands::Collect {
                language, strict, module, ..
            } => {
                assert_eq!(language, "vbnet");
                assert!(strict);
                assert_eq!(module, "root");
            }
            _ => panic!("expected collect"),
        }
    }

    #[test]
    fn test_cli_rejects_bad_scope() {
        assert!(Cli::try_parse_from(["covreg", "keys", "-l", "vbnet", "-s", "system"]).is_err());
    }

    #[tokio::test]
    async fn test_collect_from_settings_file() {
        let dir = tempfile::tempdir().unwrap();
        let settings = dir.path().join("settings.toml");
        std::fs::write(
            &settings,
            "[properties]\n\"sonar.vbnet.opencover.reportsPaths\" = [\"a.xml\", \"a.xml\"]\n",
        )
        .unwrap();

        let table = Arc::new(ConfigurationTable::builtin());
        let report = collect(table, &settings, dir.path(), "App", "vbnet", false)
            .await
            .unwrap();
        assert!(report.success());
        assert_eq!(report.coverage[0].total_paths(), 1);
        assert_eq!(report.coverage[1].total_paths(), 0);
    }

    #[tokio::test]
    async fn test_collect_strict_without_reports_fails() {
        let dir = tempfile::tempdir().unwrap();
        let settings = dir.path().join("settings.toml");
        std::fs::write(&settings, "[properties]\n").unwrap();

        let table = Arc::new(ConfigurationTable::builtin());
        let err = collect(table, &settings, dir.path(), "App", "vbnet", true)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("report sets"));
    }

    #[test]
    fn test_load_table_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("languages.toml");
        std::fs::write(&file, "[[language]]\nkey = \"fsharp\"\nname = \"F#\"\n").unwrap();
        let table = load_table(Some(&file)).unwrap();
        assert!(table.contains("fsharp"));
        assert!(!table.contains("vbnet"));
    }
}
