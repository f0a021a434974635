use burn::tensor::{backend::Backend, Tensor};

#[derive(Clone, Debug)]
pub struct TrafficBatch<B: Backend> {
    pub past_features: Tensor<B, 3>,     // [N, W, F]
    pub future_covariates: Tensor<B, 3>, // [N, W, F - 1]
    pub future_target: Tensor<B, 2>,     // [N, Ty]
}
