use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::canvas::Canvas;

/// Writes canvases as numbered PNG files.
///
/// Layout: `<root>/<label>-<timestamp>/iter_<n>/step_<k>.png`.
pub struct FrameSink {
    run_dir: PathBuf,
    episode_dir: Option<PathBuf>,
    step: usize,
}

impl FrameSink {
    /// Creates the timestamped run directory under `root`.
    pub fn create(root: impl AsRef<Path>, label: &str) -> Result<Self> {
        let stamp = chrono::Local::now().format("%Y%m%d-%H%M%S");
        let run_dir = root.as_ref().join(format!("{label}-{stamp}"));
        fs::create_dir_all(&run_dir)
            .with_context(|| format!("failed to create frame directory {}", run_dir.display()))?;
        tracing::info!("Writing frames to {}", run_dir.display());
        Ok(Self { run_dir, episode_dir: None, step: 0 })
    }

    #[must_use]
    pub fn run_dir(&self) -> &Path {
        &self.run_dir
    }

    /// Starts a new episode directory; frame numbering restarts at 0.
    pub fn begin_episode(&mut self, iteration: usize) -> Result<&Path> {
        let dir = self.run_dir.join(format!("iter_{iteration}"));
        fs::create_dir_all(&dir)
            .with_context(|| format!("failed to create episode directory {}", dir.display()))?;
        self.step = 0;
        let dir = self.episode_dir.insert(dir);
        Ok(dir.as_path())
    }

    /// Saves `canvas` as the next frame of the current episode.
    pub fn write(&mut self, canvas: &Canvas) -> Result<PathBuf> {
        if self.episode_dir.is_none() {
            self.begin_episode(0)?;
        }
        let dir = self.episode_dir.as_deref().unwrap_or(&self.run_dir);
        let path = dir.join(format!("step_{}.png", self.step));
        canvas
            .image()
            .save(&path)
            .with_context(|| format!("failed to write frame {}", path.display()))?;
        self.step += 1;
        tracing::debug!("frame {}", path.display());
        Ok(path)
    }
}
