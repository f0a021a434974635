use burn::tensor::{backend::Backend, Data, Int, Shape, Tensor};

pub fn mse_loss<B: Backend>(pred: Tensor<B, 2>, target: Tensor<B, 2>) -> Tensor<B, 1> {
    let diff = pred - target;
    (diff.clone() * diff).mean()
}

/// Reverses a tensor along `dim`, used to run the backward half of a
/// bidirectional LSTM over the flipped sequence.
pub fn reverse<B: Backend, const D: usize>(x: Tensor<B, D>, dim: usize) -> Tensor<B, D> {
    let size = x.dims()[dim];
    let indices: Vec<i32> = (0..size as i32).rev().collect();
    let data = Data::new(indices, Shape::new([size]));
    let indices: Tensor<B, 1, Int> = Tensor::from_data(data.convert());

    x.select(dim, indices)
}
