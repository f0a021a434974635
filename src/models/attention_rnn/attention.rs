use burn::config::Config;
use burn::module::Module;
use burn::nn::{Linear, LinearConfig};
use burn::tensor::activation;
use burn::tensor::{backend::Backend, Tensor};

use super::encoder::Encoding;

/// Additive attention: the decoder state is broadcast across every encoder
/// timestep, concatenated with it, and scored by a small feed-forward
/// network. Scores normalize to a distribution over Tx, and the context is
/// the weighted sum of encoder outputs under that distribution.
#[derive(Module, Debug)]
pub struct AdditiveAttention<B: Backend> {
    score_hidden: Linear<B>,
    score_output: Linear<B>,
}

impl<B: Backend> AdditiveAttention<B> {
    /// Returns `(context, weights)` for one decode step. `state` is the
    /// flattened decoder state, shape [N, d_state].
    pub fn forward(
        &self,
        encoding: &Encoding<B>,
        state: Tensor<B, 2>,
    ) -> (Tensor<B, 2>, Tensor<B, 2>) {
        assert!(encoding.tx > 0, "attention requires at least one encoder timestep");

        let repeated: Tensor<B, 3> = state.unsqueeze_dim(1);
        let repeated = repeated.repeat(1, encoding.tx);

        let scores = Tensor::cat(vec![encoding.output.clone(), repeated], 2);
        let scores = activation::relu(self.score_hidden.forward(scores));
        let scores: Tensor<B, 2> = self.score_output.forward(scores).squeeze(2);

        let weights = activation::softmax(scores, 1);

        let expanded: Tensor<B, 3> = weights.clone().unsqueeze_dim(2);
        let context: Tensor<B, 2> = (encoding.output.clone() * expanded).sum_dim(1).squeeze(1);

        (context, weights)
    }
}

#[derive(Config, Debug)]
pub struct AdditiveAttentionConfig {
    d_encoder: usize,
    d_state: usize,

    #[config(default = 80)]
    d_hidden: usize,
}

impl AdditiveAttentionConfig {
    pub fn init<B: Backend>(&self) -> AdditiveAttention<B> {
        AdditiveAttention {
            score_hidden: LinearConfig::new(self.d_encoder + self.d_state, self.d_hidden).init(),
            score_output: LinearConfig::new(self.d_hidden, 1).init(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;
    use burn::tensor::Distribution;

    type TestBackend = NdArray<f32>;

    fn encoding(batch: usize, tx: usize, d_encoder: usize) -> Encoding<TestBackend> {
        let output = Tensor::random([batch, tx, d_encoder], Distribution::Default);
        Encoding { output, tx }
    }

    #[test]
    fn weights_form_a_distribution_over_time() {
        let attention: AdditiveAttention<TestBackend> =
            AdditiveAttentionConfig::new(8, 6).init();

        let encoding = encoding(4, 9, 8);
        let state = Tensor::random([4, 6], Distribution::Default);

        let (context, weights) = attention.forward(&encoding, state);

        assert_eq!(context.dims(), [4, 8]);
        assert_eq!(weights.dims(), [4, 9]);

        let sums = weights.sum_dim(1).into_data().convert::<f32>().value;
        for sum in sums {
            assert!((sum - 1.0).abs() < 1e-5, "weights sum to {}", sum);
        }
    }

    #[test]
    fn uniform_weights_yield_the_mean_context() {
        let attention: AdditiveAttention<TestBackend> =
            AdditiveAttentionConfig::new(4, 2).init();

        // Identical encoder rows force a context equal to any single row no
        // matter how the weights distribute.
        let row = Tensor::<TestBackend, 3>::ones([1, 1, 4]);
        let output = row.repeat(1, 5);
        let encoding = Encoding { output, tx: 5 };
        let state = Tensor::zeros([1, 2]);

        let (context, _) = attention.forward(&encoding, state);
        let values = context.into_data().convert::<f32>().value;

        for value in values {
            assert!((value - 1.0).abs() < 1e-5);
        }
    }

    #[test]
    #[should_panic(expected = "attention requires at least one encoder timestep")]
    fn rejects_zero_length_encoding() {
        let attention: AdditiveAttention<TestBackend> =
            AdditiveAttentionConfig::new(4, 2).init();

        let encoding = Encoding {
            output: Tensor::zeros([1, 1, 4]),
            tx: 0,
        };
        attention.forward(&encoding, Tensor::zeros([1, 2]));
    }
}
