use ml::*;

/// Checks every analytical gradient of `f` at `inputs[which]` against a
/// central difference.
fn finite_diff_check<F>(inputs: &[Tensor], which: usize, f: F, epsilon: f32, tolerance: f32)
where
    F: Fn(&mut Tape, &[Var]) -> Result<Var>,
{
    let backend = Backend::new(BackendKind::Tape, 0);
    let (_, grads) = backend.value_and_grad(inputs, which..which + 1, &f).unwrap();
    let analytical = &grads[0];

    let eval = |values: &[Tensor]| {
        let mut tape = Tape::eager();
        let vars: Vec<Var> = values.iter().map(|t| tape.leaf(t.clone())).collect();
        let out = f(&mut tape, &vars).unwrap();
        tape.item(out).unwrap()
    };

    for i in 0..inputs[which].len() {
        let mut plus = inputs.to_vec();
        let mut minus = inputs.to_vec();
        plus[which].data[i] += epsilon;
        minus[which].data[i] -= epsilon;

        let numerical = (eval(&plus) - eval(&minus)) / (2.0 * epsilon);
        let diff = (numerical - analytical.data[i]).abs();
        assert!(
            diff < tolerance,
            "Grad check failed for element {i}. Numerical: {numerical}, Analytical: {}",
            analytical.data[i]
        );
    }
}

fn dense_tanh_loss(tape: &mut Tape, v: &[Var]) -> Result<Var> {
    let h = tape.linear(v[0], v[1], v[2])?;
    let h = tape.tanh(h)?;
    tape.sum(h)
}

fn dense_inputs() -> Vec<Tensor> {
    let mut rng = fastrand::Rng::with_seed(9);
    vec![
        Tensor::random_uniform(-1.0, 1.0, &[2, 3], &mut rng),
        Tensor::random_uniform(-0.5, 0.5, &[4, 3], &mut rng),
        Tensor::random_uniform(-0.1, 0.1, &[4], &mut rng),
    ]
}

#[test]
fn dense_backward_fd_weights() {
    finite_diff_check(&dense_inputs(), 1, dense_tanh_loss, 1e-2, 1e-2);
}

#[test]
fn dense_backward_fd_bias_and_input() {
    finite_diff_check(&dense_inputs(), 2, dense_tanh_loss, 1e-2, 1e-2);
    finite_diff_check(&dense_inputs(), 0, dense_tanh_loss, 1e-2, 1e-2);
}

#[test]
fn trig_div_and_broadcast_fd() {
    let inputs = vec![
        Tensor::from_vec(vec![3], vec![0.3, -1.1, 2.0]),
        Tensor::scalar(1.7),
    ];
    let f = |tape: &mut Tape, v: &[Var]| {
        let s = tape.sin(v[0])?;
        let c = tape.cos(v[0])?;
        let num = tape.mul(s, v[1])?;
        let den = tape.add_scalar(c, 2.5)?;
        let q = tape.div(num, den)?;
        let e = tape.exp(q)?;
        tape.sum(e)
    };
    finite_diff_check(&inputs, 0, f, 1e-2, 1e-2);
    finite_diff_check(&inputs, 1, f, 1e-2, 1e-2);
}

#[test]
fn reshape_concat_slice_fd() {
    let inputs = vec![Tensor::from_vec(vec![4], vec![0.5, -0.25, 1.5, 0.75])];
    let f = |tape: &mut Tape, v: &[Var]| {
        let head = tape.slice(v[0], 0, 2)?;
        let tail = tape.slice(v[0], 2, 2)?;
        let sq = tape.square(tail)?;
        let joined = tape.concat(&[sq, head])?;
        let m = tape.reshape(joined, &[1, 4])?;
        let flat = tape.squeeze(m, 0)?;
        let p = tape.pow(flat, 2.0)?;
        tape.sum(p)
    };
    finite_diff_check(&inputs, 0, f, 1e-2, 5e-2);
}

#[test]
fn simple_physics_gradients() {
    // y(T) of a falling body integrated with explicit Euler, differentiated
    // with respect to the initial height and velocity.
    let dt = 0.1_f32;
    let f = move |tape: &mut Tape, v: &[Var]| {
        let (mut y, mut vel) = (v[0], v[1]);
        for _ in 0..5 {
            vel = tape.add_scalar(vel, -9.81 * dt)?;
            let dy = tape.mul_scalar(vel, dt)?;
            y = tape.add(y, dy)?;
        }
        tape.sum(y)
    };
    let backend = Backend::new(BackendKind::Tape, 0);
    let (_, grads) = backend
        .value_and_grad(&[Tensor::scalar(10.0), Tensor::scalar(1.0)], 0..2, f)
        .unwrap();
    assert!((grads[0].data[0] - 1.0).abs() < 1e-6);
    assert!((grads[1].data[0] - 5.0 * dt).abs() < 1e-6);
}
