use ml::*;

fn mlp_loss(tape: &mut Tape, v: &[Var]) -> Result<Var> {
    let x = tape.expand_dims(v[0], 0)?;
    let h = tape.linear(x, v[1], v[2])?;
    let h = tape.tanh(h)?;
    let h = tape.squeeze(h, 0)?;
    let sq = tape.square(h)?;
    tape.sum(sq)
}

fn inputs(seed: u64) -> Vec<Tensor> {
    let mut backend = Backend::new(BackendKind::Graph, seed);
    vec![
        backend.random_uniform(-1.0, 1.0, &[3]),
        backend.random_uniform(-1.0, 1.0, &[2, 3]),
        backend.random_uniform(-0.1, 0.1, &[2]),
    ]
}

#[test]
fn compiled_replay_matches_fresh_trace() {
    let backend = Backend::new(BackendKind::Graph, 0);
    let mut compiled = backend.compile(&inputs(1), mlp_loss).unwrap();
    assert_eq!(compiled.num_inputs(), 3);

    for seed in 2..5 {
        let new_inputs = inputs(seed);
        let (value, grads) = compiled.value_and_grad(&new_inputs, 1..3).unwrap();
        let tape_backend = Backend::new(BackendKind::Tape, 0);
        let (fresh_value, fresh_grads) = tape_backend.value_and_grad(&new_inputs, 1..3, mlp_loss).unwrap();
        assert_eq!(value, fresh_value);
        assert_eq!(grads, fresh_grads);
        assert_eq!(compiled.call(&new_inputs).unwrap(), fresh_value);
    }
}

#[test]
fn prepared_loss_agrees_across_backends() {
    let tape_backend = Backend::new(BackendKind::Tape, 0);
    let graph_backend = Backend::new(BackendKind::Graph, 0);
    let mut on_tape = Prepared::new();
    let mut on_graph = Prepared::new();

    for seed in 10..13 {
        let x = inputs(seed);
        let a = on_tape.value_and_grad(&tape_backend, &x, 1..3, mlp_loss).unwrap();
        let b = on_graph.value_and_grad(&graph_backend, &x, 1..3, mlp_loss).unwrap();
        assert_eq!(a, b);
    }
    assert!(!on_tape.is_compiled());
    assert!(on_graph.is_compiled());
}

#[test]
fn eager_prepared_loss_is_rejected() {
    let backend = Backend::new(BackendKind::Eager, 0);
    let mut prepared = Prepared::new();
    let result = prepared.value_and_grad(&backend, &inputs(0), 1..3, mlp_loss);
    assert_eq!(result, Err(MlError::GradientUnsupported("eager")));
}
