//! The training driver: set up, then alternate visualisation, rollouts and
//! gradient steps while logging scores.

use std::path::PathBuf;

use anyhow::{Context, Result};
use gym::{Env, EnvName};
use ml::{Backend, BackendKind, GradientDescent, Prepared, Tape, Tensor, Var};
use render::{Canvas, FrameSink};

use crate::config::TrainConfig;
use crate::policy::Policy;
use crate::train::{train_step, ScoreHistory};

/// Width of rendered frames in pixels; the height follows the viewport.
pub const FRAME_WIDTH: u32 = 480;

/// Summary of a finished training run.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainReport {
    pub env: EnvName,
    pub backend: BackendKind,
    pub iterations: usize,
    /// Every mean score logged, in order.
    pub means: Vec<f32>,
    /// Score of the final iteration.
    pub last_score: Option<f32>,
    /// Where frames were written, when visuals were enabled.
    pub frames_dir: Option<PathBuf>,
}

/// Runs the whole optimisation described by `config`.
///
/// The configuration is validated and the backend chosen before anything
/// else is built, so a non-differentiable backend fails without side
/// effects.
///
/// # Errors
///
/// Returns configuration errors, any error from the backend or environment,
/// and I/O errors from writing frames.
pub fn run(config: &TrainConfig) -> Result<TrainReport> {
    let kind = config.resolve_backend()?;
    tracing::info!("Optimising a policy in {} with the {kind} backend", config.env);

    let mut backend = Backend::new(kind, config.seed);
    let mut env = gym::make(config.env, &mut backend);

    let mut sizing = Tape::eager();
    let obs = env.reset(&mut sizing)?;
    let in_size = sizing.value(obs)?.len();
    let out_size = env.action_shape().iter().product();
    let policy = Policy::new(in_size, out_size)?;
    let mut optimizer = GradientDescent::new(policy.init_params(&mut backend), config.lr);
    let mut loss = Prepared::new();
    let mut history = ScoreHistory::new(config.log_freq)?;

    let mut frames = if config.visuals {
        Some(FrameSink::create(&config.frames_dir, config.env.as_str())?)
    } else {
        None
    };

    let mut report = TrainReport {
        env: config.env,
        backend: kind,
        iterations: 0,
        means: Vec::new(),
        last_score: None,
        frames_dir: frames.as_ref().map(|f| f.run_dir().to_path_buf()),
    };

    for iteration in 0..config.iters {
        if let Some(sink) = frames.as_mut() {
            if iteration % config.vis_freq == 0 {
                visualize(env.as_mut(), &policy, optimizer.params(), sink, iteration, config.steps)
                    .with_context(|| format!("failed to render iteration {iteration}"))?;
            }
        }

        let mut tape = Tape::eager();
        env.reset(&mut tape)?;
        let initial_state = env.get_state(&tape)?;

        let compiling = iteration == 0 && kind.compiles();
        if compiling {
            tracing::info!(
                "Compiling loss function for {} environment steps... This may take a while...",
                config.steps
            );
        }
        let score = train_step(
            &mut loss,
            &backend,
            env.as_mut(),
            &policy,
            &mut optimizer,
            &initial_state,
            config.steps,
        )?;
        if compiling {
            tracing::info!("compiled");
        }

        let score = score.item()?;
        tracing::info!("iteration {iteration} score {score}");
        if let Some(mean) = history.push(score) {
            tracing::info!("mean score over the last {} iterations: {mean}", config.log_freq);
            report.means.push(mean);
        }
        report.iterations += 1;
        report.last_score = Some(score);
    }

    Ok(report)
}

/// Renders one episode of `steps` steps driven by the current parameters.
/// Nothing is differentiated or updated.
fn visualize(
    env: &mut dyn Env,
    policy: &Policy,
    params: &[Tensor],
    sink: &mut FrameSink,
    iteration: usize,
    steps: usize,
) -> Result<()> {
    let viewport = env.viewport();
    let height = (FRAME_WIDTH as f32 * viewport.height() / viewport.width()).round().max(1.0) as u32;
    let mut canvas = Canvas::new(FRAME_WIDTH, height, viewport)?;
    sink.begin_episode(iteration)?;

    let mut tape = Tape::eager();
    let params: Vec<Var> = params.iter().map(|p| tape.leaf(p.clone())).collect();
    let mut obs = env.reset(&mut tape)?;
    env.render(&tape, &mut canvas)?;
    sink.write(&canvas)?;
    for _ in 0..steps {
        let action = policy.forward(&mut tape, obs, &params)?;
        obs = env.step(&mut tape, action)?.obs;
        env.render(&tape, &mut canvas)?;
        sink.write(&canvas)?;
    }
    tracing::debug!("rendered {} frames for iteration {iteration}", steps + 1);
    Ok(())
}
