//! Command-line configuration for the server binary.

use std::{
    net::{IpAddr, Ipv4Addr, SocketAddr},
    path::PathBuf,
    time::Duration,
};

use clap::{Parser, ValueEnum};
use vidprompt_core::{Provider, RelayConfig, store::get_root_store_dir};

/// CLI wrapper for Provider enum (needed for clap ValueEnum)
#[derive(Clone, Copy, Debug, Default, ValueEnum)]
pub enum CliProvider {
    #[default]
    Openai,
    Grok,
    Gemini,
}

impl From<CliProvider> for Provider {
    fn from(cli: CliProvider) -> Self {
        match cli {
            CliProvider::Openai => Provider::Openai,
            CliProvider::Grok => Provider::Grok,
            CliProvider::Gemini => Provider::Gemini,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "vidprompt")]
#[command(about = "Stream LLM completions grounded in stored video transcripts")]
pub struct CliArgs {
    /// Port to listen on
    #[arg(long, default_value_t = 3333)]
    pub port: u16,

    /// Address to bind
    #[arg(long, default_value_t = IpAddr::V4(Ipv4Addr::UNSPECIFIED))]
    pub host: IpAddr,

    /// AI provider for completions. Its API key is read from the environment.
    #[arg(short, long, value_enum, default_value = "openai")]
    pub provider: CliProvider,

    /// Model name. Defaults to the provider's chat model.
    #[arg(short, long)]
    pub model: Option<String>,

    /// Directory holding one sub-directory per video
    #[arg(long)]
    pub store_dir: Option<PathBuf>,

    /// Fail a stream when the provider sends nothing for this many seconds
    #[arg(long)]
    pub idle_timeout_secs: Option<u64>,
}

impl CliArgs {
    pub fn provider(&self) -> Provider {
        self.provider.into()
    }

    pub fn model(&self) -> String {
        self.model
            .clone()
            .unwrap_or_else(|| self.provider().config().model.to_string())
    }

    pub fn store_dir(&self) -> PathBuf {
        self.store_dir.clone().unwrap_or_else(get_root_store_dir)
    }

    pub fn relay_config(&self) -> RelayConfig {
        RelayConfig {
            idle_timeout: self.idle_timeout_secs.map(Duration::from_secs),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub addr: SocketAddr,
}

impl From<&CliArgs> for ServerConfig {
    fn from(args: &CliArgs) -> Self {
        Self {
            addr: SocketAddr::new(args.host, args.port),
        }
    }
}
