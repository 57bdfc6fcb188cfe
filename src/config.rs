use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::Parser;
use serde::{Deserialize, Serialize};

use crate::envelope::PayoutMode;

#[derive(Parser, Debug, Clone, Default)]
#[command(name = "hongbao")]
#[command(about = "Grab red packets in your terminal")]
pub struct Cli {
    /// JSON file with settings; command line flags win over it
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Name the local player shows up as on the leaderboard
    #[arg(long)]
    pub player: Option<String>,

    /// Avatar glyph for the local player's first leaderboard entry
    #[arg(long)]
    pub avatar: Option<String>,

    /// How grab payouts are drawn
    #[arg(long, value_enum)]
    pub payout_mode: Option<PayoutMode>,

    /// Seed for the payout RNG (random when omitted)
    #[arg(long)]
    pub seed: Option<u64>,

    #[arg(long)]
    pub create_delay_ms: Option<u64>,

    #[arg(long)]
    pub grab_delay_ms: Option<u64>,

    #[arg(long)]
    pub result_delay_ms: Option<u64>,

    #[arg(long)]
    pub tick_rate_ms: Option<u64>,

    /// Directory for hongbao.log
    #[arg(long)]
    pub log_dir: Option<PathBuf>,

    /// Start with no red packets and an empty leaderboard
    #[arg(long)]
    pub no_mock_data: bool,

    /// Print the effective configuration as JSON and exit
    #[arg(long)]
    pub dump_config: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub player_name: String,
    pub player_avatar: String,
    pub payout_mode: PayoutMode,
    pub rng_seed: Option<u64>,
    pub create_delay_ms: u64,
    pub grab_delay_ms: u64,
    pub result_delay_ms: u64,
    pub tick_rate_ms: u64,
    pub log_dir: PathBuf,
    pub mock_data: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            player_name: "你".to_string(),
            player_avatar: "🎯".to_string(),
            payout_mode: PayoutMode::IndependentDraw,
            rng_seed: None,
            create_delay_ms: 1_500,
            grab_delay_ms: 2_000,
            result_delay_ms: 2_000,
            tick_rate_ms: 200,
            log_dir: PathBuf::from("logs"),
            mock_data: true,
        }
    }
}

impl Config {
    pub fn from_json(raw: &str) -> Result<Self> {
        let config: Config = serde_json::from_str(raw).context("invalid config JSON")?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        Self::from_json(&raw).with_context(|| format!("in {}", path.display()))
    }

    /// File (if any) first, then flags on top.
    pub fn load(cli: &Cli) -> Result<Self> {
        let mut config = match &cli.config {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_cli(cli);
        config.validate()?;
        Ok(config)
    }

    fn apply_cli(&mut self, cli: &Cli) {
        if let Some(player) = &cli.player {
            self.player_name = player.clone();
        }
        if let Some(avatar) = &cli.avatar {
            self.player_avatar = avatar.clone();
        }
        if let Some(mode) = cli.payout_mode {
            self.payout_mode = mode;
        }
        if cli.seed.is_some() {
            self.rng_seed = cli.seed;
        }
        if let Some(ms) = cli.create_delay_ms {
            self.create_delay_ms = ms;
        }
        if let Some(ms) = cli.grab_delay_ms {
            self.grab_delay_ms = ms;
        }
        if let Some(ms) = cli.result_delay_ms {
            self.result_delay_ms = ms;
        }
        if let Some(ms) = cli.tick_rate_ms {
            self.tick_rate_ms = ms;
        }
        if let Some(dir) = &cli.log_dir {
            self.log_dir = dir.clone();
        }
        if cli.no_mock_data {
            self.mock_data = false;
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.player_name.trim().is_empty() {
            bail!("player_name must not be blank");
        }
        if self.player_avatar.trim().is_empty() {
            bail!("player_avatar must not be blank");
        }
        if self.tick_rate_ms == 0 {
            bail!("tick_rate_ms must be greater than zero");
        }
        Ok(())
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("failed to serialize config")
    }

    pub fn create_delay(&self) -> Duration {
        Duration::from_millis(self.create_delay_ms)
    }

    pub fn grab_delay(&self) -> Duration {
        Duration::from_millis(self.grab_delay_ms)
    }

    pub fn result_delay(&self) -> Duration {
        Duration::from_millis(self.result_delay_ms)
    }

    pub fn tick_rate(&self) -> Duration {
        Duration::from_millis(self.tick_rate_ms)
    }
}
