use ml::*;

#[test]
fn dense_forward_exact() {
    let mut tape = Tape::new();
    let w = vec![
        1.0, 0.5, -0.5, -1.0, // First row
        0.2, 0.3, 0.1, 0.9, // Second row
    ];
    let b = vec![0.1, -0.2];
    let layer = Dense::new(4, 2, Activation::Identity);
    let w = tape.leaf(Tensor::from_vec(vec![2, 4], w));
    let bv = tape.leaf(Tensor::from_vec(vec![2], b.clone()));
    let x = tape.leaf(Tensor::from_vec(vec![1, 4], vec![1.0, 2.0, 3.0, 4.0]));
    let y = layer.forward(&mut tape, x, w, bv).unwrap();
    let y = tape.value(y).unwrap();

    let expected_y0 = 1.0 * 1.0 + 0.5 * 2.0 - 0.5 * 3.0 - 1.0 * 4.0 + b[0];
    let expected_y1 = 0.2 * 1.0 + 0.3 * 2.0 + 0.1 * 3.0 + 0.9 * 4.0 + b[1];

    assert_eq!(y.shape, vec![1, 2]);
    assert!((y.data[0] - expected_y0).abs() < 1e-5);
    assert!((y.data[1] - expected_y1).abs() < 1e-5);
}

#[test]
fn dense_tanh_batch_stays_in_open_interval() {
    let mut rng = fastrand::Rng::with_seed(42);
    let layer = Dense::new(3, 5, Activation::Tanh);
    let (w, b) = layer.init(&mut rng);

    let mut tape = Tape::new();
    let w = tape.leaf(w);
    let b = tape.leaf(b);
    let x = tape.leaf(Tensor::random_uniform(-1.0, 1.0, &[4, 3], &mut rng));
    let y = layer.forward(&mut tape, x, w, b).unwrap();
    let y = tape.value(y).unwrap();

    assert_eq!(y.shape, vec![4, 5]);
    assert!(y.data.iter().all(|v| *v > -1.0 && *v < 1.0));
}
