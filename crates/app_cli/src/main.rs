use std::path::{Path, PathBuf};
use std::{fs, process::ExitCode};

use anyhow::{Context, Result, bail};
use chrono::Utc;
use clap::{Parser, Subcommand, ValueEnum};
use core_types::{
    ApiConfig, ApiConfigDraft, ApiId, ApiKind, ImageApiDraft, ProviderId, TextApiDraft,
    UiLanguage, ValidationResult,
};
use i18n::I18n;
use services::{ApiConfigService, ApiConfigServiceBuilder};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use usage_stats::{format_response_time, health_level, recency, recency_label, success_rate};

#[derive(Parser)]
#[command(name = "apictl")]
#[command(about = "Manage text and image provider API configs", long_about = None)]
struct Cli {
    /// Directory holding the config store and logs
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[arg(long, global = true, value_enum, default_value_t = Lang::En)]
    lang: Lang,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Lang {
    En,
    Zh,
}

impl From<Lang> for UiLanguage {
    fn from(lang: Lang) -> Self {
        match lang {
            Lang::En => UiLanguage::EnUs,
            Lang::Zh => UiLanguage::ZhCn,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Outcome {
    Ok,
    Err,
}

#[derive(Subcommand)]
enum Commands {
    /// List configs, marking the default of each kind
    List { kind: Option<ApiKind> },
    /// Show whether text and image defaults are usable
    Status,
    /// Run the validator against a stored config
    Validate { kind: ApiKind, id: String },
    /// Add a config prefilled from the vendor template
    Add {
        kind: ApiKind,
        provider: String,
        #[arg(long)]
        name: String,
        #[arg(long)]
        api_key: String,
        #[arg(long)]
        model: Option<String>,
        #[arg(long)]
        base_url: Option<String>,
    },
    /// Remove one or more configs
    Remove {
        kind: ApiKind,
        #[arg(required = true)]
        ids: Vec<String>,
    },
    /// Flip a config between enabled and disabled
    Toggle { kind: ApiKind, id: String },
    /// Enable every listed config
    Enable {
        kind: ApiKind,
        #[arg(required = true)]
        ids: Vec<String>,
    },
    /// Disable every listed config
    Disable {
        kind: ApiKind,
        #[arg(required = true)]
        ids: Vec<String>,
    },
    /// Make a valid config the default for its kind
    SetDefault { kind: ApiKind, id: String },
    /// Print recommended starting values for a vendor
    Suggest { kind: ApiKind, provider: String },
    /// Write the full config snapshot as JSON
    Export {
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Replace all configs with a previously exported snapshot
    Import { file: PathBuf },
    /// Print the request payload built from the effective defaults
    Payload,
    /// Show usage statistics per vendor
    Stats,
    /// Delete all usage statistics
    StatsClear,
    /// Record one request outcome
    Record {
        provider: String,
        kind: ApiKind,
        #[arg(value_enum)]
        outcome: Outcome,
        #[arg(long)]
        ms: Option<f64>,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let data_dir = match cli.data_dir.clone().map_or_else(config::default_data_dir, Ok) {
        Ok(dir) => dir,
        Err(err) => {
            eprintln!("failed to resolve data dir: {err:#}");
            return ExitCode::FAILURE;
        }
    };
    if let Err(err) = fs::create_dir_all(&data_dir) {
        eprintln!("failed to prepare data dir: {err}");
    }
    let _log_guard = init_local_logger(&data_dir.join("logs"));

    match run(cli, data_dir) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("command failed: {err:#}");
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli, data_dir: PathBuf) -> Result<()> {
    let i18n = I18n::new(cli.lang.into());
    let service = ApiConfigServiceBuilder::new(data_dir)
        .build()
        .context("failed to open config store")?;

    match cli.command {
        Commands::List { kind } => {
            let kinds = kind.map_or(ApiKind::ALL.to_vec(), |kind| vec![kind]);
            for kind in kinds {
                print_configs(&service, kind);
            }
        }
        Commands::Status => {
            println!("{}", i18n.t(service.status().label_key()));
        }
        Commands::Validate { kind, id } => {
            let result = service.validate(kind, &ApiId::from(id), &i18n)?;
            print_validation(&result);
            if !result.is_valid {
                bail!("config is invalid");
            }
        }
        Commands::Add {
            kind,
            provider,
            name,
            api_key,
            model,
            base_url,
        } => {
            let provider = ProviderId::parse(kind, &provider)?;
            let draft = prefilled_draft(provider, name, api_key, model, base_url);
            let result = validation::validate_localized(&draft, &i18n);
            let id = service.add(draft)?;
            info!(%kind, %id, "config added from cli");
            println!("{id}");
            print_validation(&result);
        }
        Commands::Remove { kind, ids } => {
            let ids = to_ids(ids);
            if let [id] = ids.as_slice() {
                service.remove(kind, id)?;
                println!("removed {id}");
            } else {
                let removed = service.remove_many(kind, &ids)?;
                println!("removed {removed} of {}", ids.len());
            }
        }
        Commands::Toggle { kind, id } => {
            let id = ApiId::from(id);
            let enabled = service.toggle_enabled(kind, &id)?;
            println!("{id}: {}", if enabled { "enabled" } else { "disabled" });
        }
        Commands::Enable { kind, ids } => {
            let changed = service.set_enabled_many(kind, &to_ids(ids), true)?;
            println!("enabled {changed}");
        }
        Commands::Disable { kind, ids } => {
            let changed = service.set_enabled_many(kind, &to_ids(ids), false)?;
            println!("disabled {changed}");
        }
        Commands::SetDefault { kind, id } => {
            let id = ApiId::from(id);
            service.set_default(kind, &id)?;
            println!("default {kind} config is now {id}");
        }
        Commands::Suggest { kind, provider } => {
            let suggestion = validation::suggest(ProviderId::parse(kind, &provider)?);
            println!("{}", serde_json::to_string_pretty(&suggestion)?);
        }
        Commands::Export { out } => {
            let json = service.export_json()?;
            match out {
                Some(path) => {
                    fs::write(&path, json)
                        .with_context(|| format!("failed to write {}", path.display()))?;
                    info!(path = %path.display(), "config exported");
                }
                None => println!("{json}"),
            }
        }
        Commands::Import { file } => {
            let raw = fs::read_to_string(&file)
                .with_context(|| format!("failed to read {}", file.display()))?;
            service.import_json(&raw)?;
            info!(path = %file.display(), "config imported");
            println!("imported {}", file.display());
        }
        Commands::Payload => {
            let payload = service.derived_config();
            println!("{}", serde_json::to_string_pretty(&*payload)?);
        }
        Commands::Stats => print_stats(&service, &i18n),
        Commands::StatsClear => {
            service.clear_usage()?;
            println!("usage stats cleared");
        }
        Commands::Record {
            provider,
            kind,
            outcome,
            ms,
        } => {
            let stat =
                service.record_usage(&provider, kind, matches!(outcome, Outcome::Ok), ms)?;
            println!("{}", serde_json::to_string_pretty(&stat)?);
        }
    }

    Ok(())
}

fn to_ids(ids: Vec<String>) -> Vec<ApiId> {
    ids.into_iter().map(ApiId::from).collect()
}

fn prefilled_draft(
    provider: ProviderId,
    name: String,
    api_key: String,
    model: Option<String>,
    base_url: Option<String>,
) -> ApiConfigDraft {
    let draft = config::template(provider).unwrap_or_else(|| match provider {
        ProviderId::Text(provider) => ApiConfigDraft::Text(TextApiDraft {
            provider: Some(provider),
            ..TextApiDraft::default()
        }),
        ProviderId::Image(provider) => ApiConfigDraft::Image(ImageApiDraft {
            provider: Some(provider),
            ..ImageApiDraft::default()
        }),
    });

    match draft {
        ApiConfigDraft::Text(mut draft) => {
            draft.name = Some(name);
            draft.api_key = Some(api_key);
            draft.model = model.or(draft.model);
            draft.base_url = base_url.or(draft.base_url);
            ApiConfigDraft::Text(draft)
        }
        ApiConfigDraft::Image(mut draft) => {
            draft.name = Some(name);
            draft.api_key = Some(api_key);
            draft.model = model.or(draft.model);
            draft.base_url = base_url.or(draft.base_url);
            ApiConfigDraft::Image(draft)
        }
    }
}

fn print_configs(service: &ApiConfigService, kind: ApiKind) {
    let default_id = service.default_id(kind);
    println!("[{kind}]");
    for config in service.configs(kind) {
        let marker = if default_id.as_ref() == Some(config.id()) {
            "*"
        } else {
            " "
        };
        let state = if config.enabled() { "on " } else { "off" };
        println!(
            "{marker} {state} {}  {}  ({})",
            config.id(),
            config.name(),
            describe_provider(&config)
        );
    }
}

fn describe_provider(config: &ApiConfig) -> &'static str {
    match config {
        ApiConfig::Text(config) => config.provider.display_name(),
        ApiConfig::Image(config) => config.provider.display_name(),
    }
}

fn print_validation(result: &ValidationResult) {
    for error in &result.errors {
        println!("error: {error}");
    }
    for warning in &result.warnings {
        println!("warning: {warning}");
    }
}

fn print_stats(service: &ApiConfigService, i18n: &I18n) {
    let now = Utc::now();
    for stat in service.usage_all() {
        let rate = success_rate(&stat);
        println!(
            "{} [{}] {} requests, {:.1}% ({}), avg {}, {}",
            stat.provider,
            stat.kind,
            stat.total_requests,
            rate,
            i18n.t(health_level(rate).label_key()),
            format_response_time(stat.average_response_time),
            recency_label(&recency(&stat, now), i18n),
        );
    }
}

fn init_local_logger(log_dir: &Path) -> tracing_appender::non_blocking::WorkerGuard {
    if let Err(err) = fs::create_dir_all(log_dir) {
        eprintln!("failed to create log dir `{}`: {err}", log_dir.display());
    }
    let file_appender = tracing_appender::rolling::daily(log_dir, "apictl.log");
    let (writer, guard) = tracing_appender::non_blocking(file_appender);

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,app_cli=debug"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .json()
        .with_writer(writer)
        .init();

    guard
}
