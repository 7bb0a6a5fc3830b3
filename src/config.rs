//! Startup configuration: layers the `config` crate (env vars under the
//! `PIPELINE_` prefix, plus an optional file) under `clap` CLI flags that
//! take precedence when supplied.

use std::net::SocketAddr;

use anyhow::{bail, Context, Result};
use clap::Parser;
use serde::Deserialize;

fn default_bind() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_orchestrator() -> String {
    "local".to_string()
}

fn default_quota() -> usize {
    1
}

fn default_store() -> String {
    "memory".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

/// Raw layer produced by `config::Config` from defaults, an optional file,
/// and `PIPELINE_*` environment variables, before CLI overrides are applied.
#[derive(Debug, Clone, Deserialize)]
struct RawConfig {
    #[serde(default = "default_bind")]
    bind: String,
    #[serde(default = "default_orchestrator")]
    orchestrator: String,
    #[serde(default = "default_quota")]
    pipeline_quota: usize,
    #[serde(default = "default_store")]
    store: String,
    #[serde(default = "default_log_format")]
    log_format: String,
}

impl Default for RawConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            orchestrator: default_orchestrator(),
            pipeline_quota: default_quota(),
            store: default_store(),
            log_format: default_log_format(),
        }
    }
}

/// CLI overrides. Every flag also reads its `PIPELINE_*` environment
/// variable via clap's `env` feature; an explicit flag wins over both the
/// environment and an optional config file.
#[derive(Debug, Parser)]
#[command(author, version, about = "Pipeline lifecycle and configuration control plane")]
struct Cli {
    /// Optional config file (TOML/YAML/JSON, resolved by the `config` crate).
    #[arg(long)]
    config_file: Option<String>,

    #[arg(long, env = "PIPELINE_BIND")]
    bind: Option<String>,

    #[arg(long, env = "PIPELINE_ORCHESTRATOR")]
    orchestrator: Option<String>,

    #[arg(long, env = "PIPELINE_QUOTA")]
    pipeline_quota: Option<usize>,

    #[arg(long, env = "PIPELINE_STORE")]
    store: Option<String>,

    #[arg(long, env = "PIPELINE_LOG_FORMAT")]
    log_format: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrchestratorKind {
    Local,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreKind {
    Memory,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind: SocketAddr,
    pub orchestrator: OrchestratorKind,
    pub pipeline_quota: usize,
    pub store: StoreKind,
    pub log_format: LogFormat,
}

impl AppConfig {
    /// Parses CLI args and layers them over `config::Config`-sourced
    /// defaults/file/env. Only the `local` orchestrator and `memory` store
    /// ship in this repository; any other selection is a configuration
    /// error rather than a silent fallback.
    pub fn load() -> Result<Self> {
        let cli = Cli::parse();
        Self::from_cli(cli)
    }

    fn from_cli(cli: Cli) -> Result<Self> {
        let mut builder = config::Config::builder()
            .set_default("bind", default_bind())?
            .set_default("orchestrator", default_orchestrator())?
            .set_default("pipeline_quota", default_quota() as i64)?
            .set_default("store", default_store())?
            .set_default("log_format", default_log_format())?;

        if let Some(path) = &cli.config_file {
            builder = builder.add_source(config::File::with_name(path));
        }
        builder = builder.add_source(config::Environment::with_prefix("PIPELINE"));

        let raw: RawConfig = builder.build()?.try_deserialize().unwrap_or_default();

        let bind = cli.bind.unwrap_or(raw.bind);
        let orchestrator = cli.orchestrator.unwrap_or(raw.orchestrator);
        let pipeline_quota = cli.pipeline_quota.unwrap_or(raw.pipeline_quota);
        let store = cli.store.unwrap_or(raw.store);
        let log_format = cli.log_format.unwrap_or(raw.log_format);

        let orchestrator = match orchestrator.as_str() {
            "local" => OrchestratorKind::Local,
            other => bail!("orchestrator '{other}' is not implemented by this core; only 'local' ships"),
        };
        let store = match store.as_str() {
            "memory" => StoreKind::Memory,
            other => bail!("store backend '{other}' is not implemented by this core; only 'memory' ships"),
        };
        let log_format = match log_format.as_str() {
            "pretty" => LogFormat::Pretty,
            "json" => LogFormat::Json,
            other => bail!("log format '{other}' must be 'pretty' or 'json'"),
        };
        let bind: SocketAddr = bind.parse().with_context(|| format!("invalid --bind address '{bind}'"))?;

        Ok(Self { bind, orchestrator, pipeline_quota, store, log_format })
    }
}
