use burn::config::Config;
use burn::module::Module;
use burn::nn::{Linear, LinearConfig};
use burn::tensor::activation;
use burn::tensor::{backend::Backend, Tensor};

/// Independent linear+ReLU projections mapping the two input streams into a
/// shared embedding width. The secondary stream carries one fewer feature
/// than the primary: the target column is dropped from it upstream.
#[derive(Module, Debug)]
pub struct StreamProjector<B: Backend> {
    d_primary: usize,
    d_secondary: usize,
    primary: Linear<B>,
    secondary: Linear<B>,
}

impl<B: Backend> StreamProjector<B> {
    pub fn forward(&self, x1: Tensor<B, 3>, x2: Tensor<B, 3>) -> (Tensor<B, 3>, Tensor<B, 3>) {
        let [batch1, _, features1] = x1.dims();
        let [batch2, _, features2] = x2.dims();

        assert_eq!(
            features1, self.d_primary,
            "primary stream has {} features, expected {}",
            features1, self.d_primary
        );
        assert_eq!(
            features2, self.d_secondary,
            "secondary stream has {} features, expected {}",
            features2, self.d_secondary
        );
        assert_eq!(
            batch1, batch2,
            "streams disagree on batch size: {} vs {}",
            batch1, batch2
        );

        let x1 = activation::relu(self.primary.forward(x1));
        let x2 = activation::relu(self.secondary.forward(x2));

        (x1, x2)
    }
}

#[derive(Config, Debug)]
pub struct StreamProjectorConfig {
    d_input: usize,
    d_project: usize,
}

impl StreamProjectorConfig {
    pub fn init<B: Backend>(&self) -> StreamProjector<B> {
        assert!(
            self.d_input >= 2,
            "primary stream needs at least two features, got {}",
            self.d_input
        );

        StreamProjector {
            d_primary: self.d_input,
            d_secondary: self.d_input - 1,
            primary: LinearConfig::new(self.d_input, self.d_project).init(),
            secondary: LinearConfig::new(self.d_input - 1, self.d_project).init(),
        }
    }
}
