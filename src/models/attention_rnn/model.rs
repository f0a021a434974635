use burn::config::Config;
use burn::module::Module;
use burn::nn::{Dropout, DropoutConfig, Linear, LinearConfig};
use burn::tensor::backend::AutodiffBackend;
use burn::tensor::{backend::Backend, Tensor};
use burn::train::{RegressionOutput, TrainOutput, TrainStep, ValidStep};

use crate::data::batchitem::TrafficBatch;
use crate::utils::mse_loss;

use super::attention::{AdditiveAttention, AdditiveAttentionConfig};
use super::decoder::{ContextDecoder, ContextDecoderConfig, DecoderState};
use super::encoder::{Encoding, RecurrentEncoder, RecurrentEncoderConfig};
use super::projection::{StreamProjector, StreamProjectorConfig};

/// Sequence-to-sequence attention forecaster. Both input streams are
/// projected, concatenated along the time axis, and encoded once; the
/// decoder then runs step-wise, each step attending over the full encoding.
#[derive(Module, Debug)]
pub struct AttentionRnn<B: Backend> {
    ty: usize,
    num_alphabet: usize,
    d_decoder_hidden: usize,
    projector: StreamProjector<B>,
    encoder: RecurrentEncoder<B>,
    encoder_dropout: Dropout,
    attention: AdditiveAttention<B>,
    decoder: ContextDecoder<B>,
    output_proj: Linear<B>,
}

impl<B: Backend> AttentionRnn<B> {
    /// Runs the encode half once. Every later decode step borrows the
    /// returned encoding read-only.
    pub fn encode(&self, x1: Tensor<B, 3>, x2: Tensor<B, 3>) -> Encoding<B> {
        let (x1, x2) = self.projector.forward(x1, x2);
        let x = Tensor::cat(vec![x1, x2], 1);

        let encoding = self.encoder.forward(x);

        Encoding {
            output: self.encoder_dropout.forward(encoding.output),
            tx: encoding.tx,
        }
    }

    fn decode_step(
        &self,
        encoding: &Encoding<B>,
        state: DecoderState<B>,
    ) -> (Tensor<B, 2>, Tensor<B, 2>, DecoderState<B>) {
        // Single decoder layer: the flattened previous state is the hidden
        // tensor itself.
        let (context, weights) = self.attention.forward(encoding, state.hidden.clone());
        let (output, state) = self.decoder.step(context, state);
        let y = self.output_proj.forward(output);

        (y, weights, state)
    }

    /// Training-mode pass: exactly `ty` lockstep steps over the whole
    /// batch, output [N, Ty, num_alphabet].
    pub fn forward(&self, x1: Tensor<B, 3>, x2: Tensor<B, 3>) -> Tensor<B, 3> {
        self.forward_with_attention(x1, x2).0
    }

    /// Same as `forward`, additionally returning the attention weights of
    /// every step, in step order. Always exactly `ty` entries of shape
    /// [N, Tx].
    pub fn forward_with_attention(
        &self,
        x1: Tensor<B, 3>,
        x2: Tensor<B, 3>,
    ) -> (Tensor<B, 3>, Vec<Tensor<B, 2>>) {
        let [batch_size, _, _] = x1.dims();
        let encoding = self.encode(x1, x2);

        let mut state = DecoderState::init(batch_size, self.d_decoder_hidden);
        let mut outputs = Vec::with_capacity(self.ty);
        let mut attention = Vec::with_capacity(self.ty);

        for _ in 0..self.ty {
            let (y, weights, next) = self.decode_step(&encoding, state);
            outputs.push(y);
            attention.push(weights);
            state = next;
        }

        (Tensor::stack(outputs, 1), attention)
    }

    /// Autoregressive inference over one unbatched example. Emits the
    /// argmax index per step and stops the moment it equals `eos`, keeping
    /// that final index in the result. Runs at most `max_iter` steps.
    pub fn predict(
        &self,
        x1: Tensor<B, 2>,
        x2: Tensor<B, 2>,
        eos: usize,
        max_iter: usize,
    ) -> Vec<usize> {
        self.predict_with_attention(x1, x2, eos, max_iter).0
    }

    pub fn predict_with_attention(
        &self,
        x1: Tensor<B, 2>,
        x2: Tensor<B, 2>,
        eos: usize,
        max_iter: usize,
    ) -> (Vec<usize>, Vec<Tensor<B, 2>>) {
        let x1: Tensor<B, 3> = x1.unsqueeze();
        let x2: Tensor<B, 3> = x2.unsqueeze();
        let encoding = self.encode(x1, x2);

        let mut state = DecoderState::init(1, self.d_decoder_hidden);
        let mut result = Vec::new();
        let mut attention = Vec::new();

        for _ in 0..max_iter {
            let (y, weights, next) = self.decode_step(&encoding, state);
            state = next;
            attention.push(weights);

            let index = y.argmax(1).into_data().convert::<i64>().value[0] as usize;
            result.push(index);
            if index == eos {
                break;
            }
        }

        (result, attention)
    }

    pub fn forward_regression(
        &self,
        x1: Tensor<B, 3>,
        x2: Tensor<B, 3>,
        target: Tensor<B, 2>,
    ) -> RegressionOutput<B> {
        assert_eq!(
            self.num_alphabet, 1,
            "regression training expects a single output value per step, model emits {}",
            self.num_alphabet
        );
        assert_eq!(
            target.dims()[1],
            self.ty,
            "target covers {} steps, model decodes {}",
            target.dims()[1],
            self.ty
        );

        let pred: Tensor<B, 2> = self.forward(x1, x2).squeeze(2);
        let loss = mse_loss(pred.clone(), target.clone());

        RegressionOutput::new(loss, pred, target)
    }
}

impl<B: AutodiffBackend> TrainStep<TrafficBatch<B>, RegressionOutput<B>> for AttentionRnn<B> {
    fn step(&self, batch: TrafficBatch<B>) -> TrainOutput<RegressionOutput<B>> {
        let item = self.forward_regression(
            batch.past_features,
            batch.future_covariates,
            batch.future_target,
        );
        TrainOutput::new(self, item.loss.backward(), item)
    }
}

impl<B: Backend> ValidStep<TrafficBatch<B>, RegressionOutput<B>> for AttentionRnn<B> {
    fn step(&self, batch: TrafficBatch<B>) -> RegressionOutput<B> {
        self.forward_regression(
            batch.past_features,
            batch.future_covariates,
            batch.future_target,
        )
    }
}

#[derive(Config, Debug)]
pub struct AttentionRnnConfig {
    input_size: usize,
    num_alphabet: usize,
    ty: usize,

    #[config(default = 256)]
    project_size: usize,

    #[config(default = 128)]
    encoder_hidden_size: usize,

    #[config(default = 2)]
    encoder_num_layers: usize,

    #[config(default = 128)]
    decoder_hidden_size: usize,

    #[config(default = 80)]
    attention_hidden_size: usize,

    #[config(default = 0.1)]
    dropout: f64,
}

impl AttentionRnnConfig {
    pub fn init<B: Backend>(&self) -> AttentionRnn<B> {
        assert!(self.ty > 0, "decoder horizon must be positive");

        let d_encoded = self.encoder_hidden_size * 2;

        let projector = StreamProjectorConfig::new(self.input_size, self.project_size).init();
        let encoder = RecurrentEncoderConfig::new(self.project_size, self.encoder_hidden_size)
            .with_num_layers(self.encoder_num_layers)
            .with_dropout(self.dropout)
            .init();
        let attention = AdditiveAttentionConfig::new(d_encoded, self.decoder_hidden_size)
            .with_d_hidden(self.attention_hidden_size)
            .init();
        let decoder = ContextDecoderConfig::new(d_encoded, self.decoder_hidden_size)
            .with_dropout(self.dropout)
            .init();
        let output_proj = LinearConfig::new(self.decoder_hidden_size, self.num_alphabet).init();

        AttentionRnn {
            ty: self.ty,
            num_alphabet: self.num_alphabet,
            d_decoder_hidden: self.decoder_hidden_size,
            projector,
            encoder,
            encoder_dropout: DropoutConfig::new(self.dropout).init(),
            attention,
            decoder,
            output_proj,
        }
    }
}
