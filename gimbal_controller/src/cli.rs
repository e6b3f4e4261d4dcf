use clap::Parser;
use ptu::SweepPattern;
use std::path::PathBuf;

use crate::{
    config::{DEFAULT_CONFIG_PATH, GimbalConfig},
    controller::RunSelection,
};

#[derive(Debug, Parser)]
#[command(version, about = "Sweep or jog a pan/tilt gimbal over its TCP command port")]
pub struct Args {
    /// Number of repetitions
    #[arg(short = 'r', long = "reps", default_value_t = 1)]
    pub reps: u32,

    /// Amount of time (in sec) to keep sweeping
    #[arg(short = 't', long, default_value_t = 0)]
    pub timespan: u64,

    /// Sweep continuously until interrupted
    #[arg(short, long)]
    pub continuous: bool,

    /// Manual control of the gimbal with WASD or the arrow keys
    #[arg(short, long)]
    pub manual: bool,

    /// Gimbal address, overrides the config file
    #[arg(long)]
    pub host: Option<String>,

    /// Gimbal command port, overrides the config file
    #[arg(long)]
    pub port: Option<u16>,

    /// Sweep pattern: corners or edges
    #[arg(long)]
    pub pattern: Option<SweepPattern>,

    /// Path to the TOML config file
    #[arg(long, env = "CONFIG_PATH", default_value = DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,
}

impl Args {
    pub fn selection(&self) -> RunSelection {
        RunSelection {
            manual: self.manual,
            continuous: self.continuous,
            timespan: self.timespan,
            repetitions: self.reps,
        }
    }

    pub fn apply_overrides(&self, config: &mut GimbalConfig) {
        if let Some(host) = &self.host {
            config.connection.host = host.clone();
        }
        if let Some(port) = self.port {
            config.connection.port = port;
        }
        if let Some(pattern) = self.pattern {
            config.motion.pattern = pattern;
        }
    }
}
