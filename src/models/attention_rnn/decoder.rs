use burn::config::Config;
use burn::module::Module;
use burn::nn::{Dropout, DropoutConfig, Lstm, LstmConfig};
use burn::tensor::{backend::Backend, Tensor};

/// Recurrent state threaded through the decode loop by value. Created once
/// per sequence, zero-valued, and replaced wholesale by every step.
#[derive(Clone, Debug)]
pub struct DecoderState<B: Backend> {
    pub hidden: Tensor<B, 2>, // [N, d_hidden]
    pub cell: Tensor<B, 2>,   // [N, d_hidden]
}

impl<B: Backend> DecoderState<B> {
    pub fn init(batch_size: usize, d_hidden: usize) -> Self {
        Self {
            hidden: Tensor::zeros([batch_size, d_hidden]),
            cell: Tensor::zeros([batch_size, d_hidden]),
        }
    }
}

/// Single-layer recurrent decoder advanced one timestep per call. It never
/// sees raw encoder output, only the attention context for the step.
#[derive(Module, Debug)]
pub struct ContextDecoder<B: Backend> {
    lstm: Lstm<B>,
    dropout: Dropout,
}

impl<B: Backend> ContextDecoder<B> {
    pub fn step(
        &self,
        context: Tensor<B, 2>,
        state: DecoderState<B>,
    ) -> (Tensor<B, 2>, DecoderState<B>) {
        let input: Tensor<B, 3> = context.unsqueeze_dim(1);

        let (cell, hidden) = self.lstm.forward(input, Some((state.cell, state.hidden)));

        let hidden: Tensor<B, 2> = hidden.squeeze(1);
        let cell: Tensor<B, 2> = cell.squeeze(1);

        let output = self.dropout.forward(hidden.clone());

        (output, DecoderState { hidden, cell })
    }
}

#[derive(Config, Debug)]
pub struct ContextDecoderConfig {
    d_context: usize,
    d_hidden: usize,

    #[config(default = 0.0)]
    dropout: f64,
}

impl ContextDecoderConfig {
    pub fn init<B: Backend>(&self) -> ContextDecoder<B> {
        ContextDecoder {
            lstm: LstmConfig::new(self.d_context, self.d_hidden, true).init(),
            dropout: DropoutConfig::new(self.dropout).init(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;
    use burn::tensor::Distribution;

    type TestBackend = NdArray<f32>;

    #[test]
    fn step_emits_output_and_fresh_state() {
        let decoder: ContextDecoder<TestBackend> = ContextDecoderConfig::new(6, 4).init();

        let state = DecoderState::init(3, 4);
        let context = Tensor::random([3, 6], Distribution::Default);

        let (output, next) = decoder.step(context, state);

        assert_eq!(output.dims(), [3, 4]);
        assert_eq!(next.hidden.dims(), [3, 4]);
        assert_eq!(next.cell.dims(), [3, 4]);
    }

    #[test]
    fn state_advances_across_steps() {
        let decoder: ContextDecoder<TestBackend> = ContextDecoderConfig::new(2, 3).init();

        let context = Tensor::<TestBackend, 2>::ones([1, 2]);
        let (_, first) = decoder.step(context.clone(), DecoderState::init(1, 3));
        let (_, second) = decoder.step(context, first.clone());

        let first_hidden = first.hidden.into_data().convert::<f32>().value;
        let second_hidden = second.hidden.into_data().convert::<f32>().value;

        // Feeding the same context twice still moves the state: the second
        // step starts from a non-zero (hidden, cell) pair.
        assert_ne!(first_hidden, second_hidden);
    }
}
