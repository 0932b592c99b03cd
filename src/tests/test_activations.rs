use ndarray::array;
use crate::activations::Activation;

#[test]
fn test_relu_apply_and_derivative() {
    let mut data = array![[-1.0, 0.0, 2.0]];
    Activation::Relu.apply_batch(&mut data);
    assert_eq!(data, array![[0.0, 0.0, 2.0]]);

    let deriv = Activation::Relu.derivative_batch(array![[-1.0, 0.0, 2.0]].view());
    assert_eq!(deriv, array![[0.0, 0.0, 1.0]]);
}

#[test]
fn test_linear_is_identity() {
    let mut data = array![[-3.0, 4.5]];
    Activation::Linear.apply_batch(&mut data);
    assert_eq!(data, array![[-3.0, 4.5]]);
    assert_eq!(Activation::Linear.derivative_batch(data.view()), array![[1.0, 1.0]]);
}

#[test]
fn test_tanh_derivative_at_zero() {
    let mut data = array![[0.0, 10.0]];
    Activation::Tanh.apply_batch(&mut data);
    assert_eq!(data[[0, 0]], 0.0);
    assert!((data[[0, 1]] - 1.0).abs() < 1e-4);

    let deriv = Activation::Tanh.derivative_batch(array![[0.0]].view());
    assert_eq!(deriv, array![[1.0]]);
}
