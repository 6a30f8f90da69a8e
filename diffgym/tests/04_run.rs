use std::path::PathBuf;

use diffgym::TrainConfig;
use gym::EnvName;
use ml::BackendKind;

fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("diffgym-run-{name}-{}", std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    dir
}

#[test]
fn headless_run_logs_means() {
    for env in EnvName::ALL {
        let config = TrainConfig {
            env,
            backend: Some(BackendKind::Graph),
            steps: 3,
            iters: 4,
            log_freq: 2,
            visuals: false,
            ..TrainConfig::default()
        };
        let report = diffgym::run(&config).unwrap();
        assert_eq!(report.iterations, 4, "{env}");
        assert_eq!(report.means.len(), 2, "{env}");
        assert!(report.last_score.is_some_and(f32::is_finite), "{env}");
        assert_eq!(report.frames_dir, None);
    }
}

#[test]
fn random_backend_choice_is_differentiable() {
    for seed in 0..8 {
        let config = TrainConfig { seed, steps: 2, iters: 1, visuals: false, ..TrainConfig::default() };
        let report = diffgym::run(&config).unwrap();
        assert!(report.backend.supports_grad());
    }
}

#[test]
fn visual_run_writes_frames() {
    let root = scratch_dir("frames");
    let config = TrainConfig {
        env: EnvName::Pendulum,
        backend: Some(BackendKind::Tape),
        steps: 2,
        iters: 3,
        vis_freq: 2,
        log_freq: 10,
        frames_dir: root.clone(),
        ..TrainConfig::default()
    };
    let report = diffgym::run(&config).unwrap();
    assert!(report.means.is_empty());
    let run_dir = report.frames_dir.unwrap();
    assert!(run_dir.starts_with(&root));
    for iteration in [0, 2] {
        for step in 0..=2 {
            let frame = run_dir.join(format!("iter_{iteration}")).join(format!("step_{step}.png"));
            assert!(frame.is_file(), "missing {}", frame.display());
        }
    }
    assert!(!run_dir.join("iter_1").exists());
    std::fs::remove_dir_all(&root).unwrap();
}
