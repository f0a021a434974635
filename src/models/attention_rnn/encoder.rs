use burn::config::Config;
use burn::module::Module;
use burn::nn::{Dropout, DropoutConfig, Lstm, LstmConfig};
use burn::tensor::{backend::Backend, Tensor};

use crate::utils::reverse;

/// Encoder output together with the sequence length observed at encode
/// time. Tx depends on the window length of the actual input, so it travels
/// with the encoding instead of living on the model.
#[derive(Clone, Debug)]
pub struct Encoding<B: Backend> {
    pub output: Tensor<B, 3>, // [N, Tx, 2 * d_hidden]
    pub tx: usize,
}

/// Two LSTM cells over the sequence and its time-reversal, outputs
/// concatenated along the feature axis.
#[derive(Module, Debug)]
pub struct BidirectionalLstm<B: Backend> {
    forward_lstm: Lstm<B>,
    backward_lstm: Lstm<B>,
}

impl<B: Backend> BidirectionalLstm<B> {
    pub fn forward(&self, x: Tensor<B, 3>) -> Tensor<B, 3> {
        let (_, forward_hidden) = self.forward_lstm.forward(x.clone(), None);
        let (_, backward_hidden) = self.backward_lstm.forward(reverse(x, 1), None);
        let backward_hidden = reverse(backward_hidden, 1);

        Tensor::cat(vec![forward_hidden, backward_hidden], 2)
    }
}

#[derive(Module, Debug)]
pub struct RecurrentEncoder<B: Backend> {
    layers: Vec<BidirectionalLstm<B>>,
    dropout: Dropout,
}

impl<B: Backend> RecurrentEncoder<B> {
    pub fn forward(&self, x: Tensor<B, 3>) -> Encoding<B> {
        let last = self.layers.len() - 1;

        let mut x = x;
        for (index, layer) in self.layers.iter().enumerate() {
            x = layer.forward(x);
            if index < last {
                x = self.dropout.forward(x);
            }
        }

        let [_, tx, _] = x.dims();
        assert!(tx > 0, "encoder produced zero timesteps");

        Encoding { output: x, tx }
    }
}

#[derive(Config, Debug)]
pub struct RecurrentEncoderConfig {
    d_input: usize,
    d_hidden: usize,

    #[config(default = 2)]
    num_layers: usize,

    #[config(default = 0.0)]
    dropout: f64,
}

impl RecurrentEncoderConfig {
    pub fn init<B: Backend>(&self) -> RecurrentEncoder<B> {
        assert!(self.num_layers > 0, "encoder needs at least one layer");

        let layers: Vec<BidirectionalLstm<B>> = (0..self.num_layers)
            .map(|index| {
                // Layers past the first consume the concatenated output of
                // both directions.
                let d_input = if index == 0 {
                    self.d_input
                } else {
                    self.d_hidden * 2
                };

                BidirectionalLstm {
                    forward_lstm: LstmConfig::new(d_input, self.d_hidden, true).init(),
                    backward_lstm: LstmConfig::new(d_input, self.d_hidden, true).init(),
                }
            })
            .collect();

        RecurrentEncoder {
            layers,
            dropout: DropoutConfig::new(self.dropout).init(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type TestBackend = NdArray<f32>;

    #[test]
    fn output_width_is_twice_hidden_and_tx_is_recorded() {
        let encoder: RecurrentEncoder<TestBackend> =
            RecurrentEncoderConfig::new(6, 8).with_num_layers(2).init();

        let encoding = encoder.forward(Tensor::zeros([3, 11, 6]));

        assert_eq!(encoding.output.dims(), [3, 11, 16]);
        assert_eq!(encoding.tx, 11);
    }

    #[test]
    fn single_layer_stack_applies_no_inter_layer_dropout_path() {
        let encoder: RecurrentEncoder<TestBackend> = RecurrentEncoderConfig::new(4, 5)
            .with_num_layers(1)
            .with_dropout(0.5)
            .init();

        let encoding = encoder.forward(Tensor::zeros([1, 3, 4]));

        assert_eq!(encoding.output.dims(), [1, 3, 10]);
    }

    #[test]
    #[should_panic(expected = "encoder needs at least one layer")]
    fn rejects_empty_stack() {
        let _encoder: RecurrentEncoder<TestBackend> =
            RecurrentEncoderConfig::new(4, 5).with_num_layers(0).init();
    }
}
