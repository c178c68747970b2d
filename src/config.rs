//! Server configuration: CLI flags (each backed by an env var) resolved over defaults.

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{anyhow, bail, Context, Result};
use clap::Parser;

use crate::filestore::{EffectiveConfig, FilestoreConfig, GlobalFilestoreConfig};

pub const DEV_PORT: u16 = 3001;
pub const PRODUCTION_PORT: u16 = 7788;

#[derive(Parser, Debug, Clone, Default, PartialEq)]
#[command(name = "turbome-server")]
#[command(author, version, about = "REST server over markdown files in a git working tree", long_about = None)]
pub struct ServerArgs {
    /// Directory served as the storage root (required outside production mode)
    #[arg(long, env = "STORAGE_DIR", value_name = "DIR")]
    pub storage_dir: Option<PathBuf>,

    /// HTTP port [default: 7788 in production, 3001 otherwise]
    #[arg(long, env = "PORT")]
    pub port: Option<u16>,

    #[arg(long, env = "TURBOME_HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Production mode; also selected by TURBOME_ENV=production or NODE_ENV=production
    #[arg(long)]
    pub production: bool,

    /// Run `git init` in the storage root when it is not a repository yet
    #[arg(long, env = "TURBOME_INIT_GIT")]
    pub init_git: bool,

    #[arg(long, env = "TURBOME_GIT_TIMEOUT_MS", value_name = "MS")]
    pub git_timeout_ms: Option<u64>,

    #[arg(long, env = "TURBOME_GIT_COMMIT_TIMEOUT_MS", value_name = "MS")]
    pub git_commit_timeout_ms: Option<u64>,

    /// Cap on matched lines collected by content search
    #[arg(long, env = "TURBOME_SEARCH_MAX_CONTENT_MATCHES", value_name = "N")]
    pub search_max_content_matches: Option<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    Development,
    Production,
}

impl RunMode {
    pub fn detect(flag: bool, env: impl Fn(&str) -> Option<String>) -> Self {
        let named = |key: &str| env(key).map(|v| v.trim().eq_ignore_ascii_case("production")).unwrap_or(false);
        if flag || named("TURBOME_ENV") || named("NODE_ENV") {
            RunMode::Production
        } else {
            RunMode::Development
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RunMode::Development => "development",
            RunMode::Production => "production",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    pub mode: RunMode,
    pub storage_dir: PathBuf,
    pub addr: SocketAddr,
    pub init_git: bool,
    pub filestore: EffectiveConfig,
}

impl ServerConfig {
    pub fn resolve(args: ServerArgs) -> Result<Self> {
        let cwd = std::env::current_dir().context("reading current directory")?;
        Self::resolve_with(args, |k| std::env::var(k).ok(), cwd)
    }

    /// Resolution with an injectable env lookup and working directory.
    pub fn resolve_with(args: ServerArgs, env: impl Fn(&str) -> Option<String>, cwd: PathBuf) -> Result<Self> {
        let mode = RunMode::detect(args.production, env);
        let storage_dir = match (args.storage_dir, mode) {
            (Some(dir), _) if !dir.as_os_str().is_empty() => dir,
            (_, RunMode::Production) => cwd,
            (_, RunMode::Development) => bail!("STORAGE_DIR environment variable must be set in development mode"),
        };
        let port = args.port.unwrap_or(match mode {
            RunMode::Production => PRODUCTION_PORT,
            RunMode::Development => DEV_PORT,
        });
        let ip = args
            .host
            .parse::<std::net::IpAddr>()
            .map_err(|e| anyhow!("invalid host '{}': {}", args.host, e))?;
        let overrides = FilestoreConfig {
            git_timeout_ms: args.git_timeout_ms,
            git_commit_timeout_ms: args.git_commit_timeout_ms,
            search_max_content_matches: args.search_max_content_matches,
            ..Default::default()
        };
        Ok(Self {
            mode,
            storage_dir,
            addr: SocketAddr::new(ip, port),
            init_git: args.init_git,
            filestore: EffectiveConfig::from_layers(&GlobalFilestoreConfig::default(), &overrides),
        })
    }
}
