use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use gym::EnvName;
use ml::BackendKind;

use crate::config::TrainConfig;

/// Optimise a policy by differentiating through a simulated environment.
#[derive(Parser, Debug)]
#[command(name = "diffgym", version)]
pub struct Cli {
    /// Do not render episodes to PNG frames.
    #[arg(long = "no-visuals", alias = "no_visuals")]
    pub no_visuals: bool,

    /// Environment: CartPole, Pendulum, MountainCar, Reacher or Swimmer.
    #[arg(long)]
    pub env: Option<EnvName>,

    /// Numeric backend: tape or graph. Chosen at random when omitted.
    #[arg(long, visible_alias = "framework")]
    pub backend: Option<BackendKind>,

    /// Environment steps per rollout.
    #[arg(long)]
    pub steps: Option<usize>,

    /// Number of gradient steps.
    #[arg(long)]
    pub iters: Option<usize>,

    /// Learning rate.
    #[arg(long)]
    pub lr: Option<f32>,

    #[arg(long)]
    pub seed: Option<u64>,

    /// Iterations per logged mean score.
    #[arg(long)]
    pub log_freq: Option<usize>,

    /// Iterations between rendered episodes.
    #[arg(long)]
    pub vis_freq: Option<usize>,

    /// Root directory for rendered frames.
    #[arg(long)]
    pub frames_dir: Option<PathBuf>,

    /// JSON file with a training configuration. Flags given on the command
    /// line override its values.
    #[arg(long)]
    pub config: Option<PathBuf>,
}

impl Cli {
    /// Builds the config from defaults or `--config`, then applies flags.
    /// The result is validated, so an eager backend is rejected here.
    pub fn into_config(self) -> Result<TrainConfig> {
        let mut cfg = match &self.config {
            Some(path) => TrainConfig::load(path)?,
            None => TrainConfig::default(),
        };

        if self.no_visuals {
            cfg.visuals = false;
        }
        if let Some(env) = self.env {
            cfg.env = env;
        }
        if self.backend.is_some() {
            cfg.backend = self.backend;
        }
        if let Some(steps) = self.steps {
            cfg.steps = steps;
        }
        if let Some(iters) = self.iters {
            cfg.iters = iters;
        }
        if let Some(lr) = self.lr {
            cfg.lr = lr;
        }
        if let Some(seed) = self.seed {
            cfg.seed = seed;
        }
        if let Some(log_freq) = self.log_freq {
            cfg.log_freq = log_freq;
        }
        if let Some(vis_freq) = self.vis_freq {
            cfg.vis_freq = vis_freq;
        }
        if let Some(frames_dir) = self.frames_dir {
            cfg.frames_dir = frames_dir;
        }

        cfg.validate()?;
        Ok(cfg)
    }
}
