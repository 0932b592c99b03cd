use ndarray::array;
use crate::optimizer::{Adam, Optimizer, OptimizerKind, OptimizerWrapper, Sgd};

#[test]
fn test_sgd_update_weights() {
    let mut sgd = Sgd::new();
    let mut weights = array![[1.0, 1.0], [1.0, 1.0]];
    let gradients = array![[0.1, 0.2], [0.3, 0.4]];
    let learning_rate = 0.01;

    sgd.update_weights(0, &mut weights, &gradients, learning_rate);

    let expected_weights = array![[0.999, 0.998], [0.997, 0.996]];
    for (w, e) in weights.iter().zip(expected_weights.iter()) {
        assert!((w - e).abs() < 1e-6);
    }
}

#[test]
fn test_sgd_update_biases() {
    let mut sgd = Sgd::new();
    let mut biases = array![1.0, 1.0];
    let gradients = array![0.1, 0.2];

    sgd.update_biases(0, &mut biases, &gradients, 0.01);

    assert!((biases[0] - 0.999).abs() < 1e-6);
    assert!((biases[1] - 0.998).abs() < 1e-6);
}

#[test]
fn test_adam_first_step_moves_by_learning_rate() {
    // with bias correction the first Adam step is lr * sign(g)
    let mut adam = Adam::default();
    let mut weights = array![[1.0, -1.0]];
    let gradients = array![[0.5, -2.0]];

    adam.begin_step();
    adam.update_weights(0, &mut weights, &gradients, 0.1);

    assert!((weights[[0, 0]] - 0.9).abs() < 1e-4);
    assert!((weights[[0, 1]] + 0.9).abs() < 1e-4);
    assert_eq!(adam.t, 1);
}

#[test]
fn test_adam_keeps_state_per_layer() {
    let mut adam = Adam::default();
    let mut first = array![[0.0, 0.0]];
    let mut second = array![[0.0], [0.0], [0.0]];

    adam.begin_step();
    adam.update_weights(0, &mut first, &array![[1.0, 1.0]], 0.01);
    adam.update_weights(1, &mut second, &array![[1.0], [1.0], [1.0]], 0.01);
    adam.begin_step();
    adam.update_weights(0, &mut first, &array![[1.0, 1.0]], 0.01);
    adam.update_weights(1, &mut second, &array![[1.0], [1.0], [1.0]], 0.01);

    // constant gradients: every step moves by ~lr regardless of the other layer
    assert!((first[[0, 0]] + 0.02).abs() < 1e-4);
    assert!((second[[2, 0]] + 0.02).abs() < 1e-4);
}

#[test]
fn test_optimizer_kind_builds_fresh_state() {
    match OptimizerKind::default().build() {
        OptimizerWrapper::Adam(adam) => {
            assert_eq!(adam.t, 0);
            assert_eq!(adam.beta1, 0.9);
        }
        OptimizerWrapper::Sgd(_) => panic!("default optimizer should be Adam"),
    }
    assert!(matches!(OptimizerKind::Sgd.build(), OptimizerWrapper::Sgd(_)));
}
