use burn::config::Config;
use burn::data::dataloader::DataLoaderBuilder;
use burn::data::dataset::InMemDataset;
use burn::module::AutodiffModule;
use burn::optim::{AdamConfig, Optimizer};
use burn::tensor::backend::{AutodiffBackend, Backend};
use burn::tensor::Tensor;
use burn::train::{TrainStep, ValidStep};
use tracing::info;

use crate::data::metroitem::{MetroItem, TrafficBatcher};
use crate::models::attention_rnn::AttentionRnn;

#[derive(Config, Debug)]
pub struct TrainingConfig {
    #[config(default = 4)]
    pub batch_size: usize,

    #[config(default = 60)]
    pub num_epochs: usize,

    #[config(default = 1.0e-3)]
    pub learning_rate: f64,

    #[config(default = 20)]
    pub print_every: usize,
}

fn scalar_loss<B: Backend>(loss: Tensor<B, 1>) -> f32 {
    loss.into_data().convert::<f32>().value[0]
}

/// Drives the model's train/valid steps over windowed data. Windows are
/// temporally ordered, so neither loader shuffles.
pub fn train<B: AutodiffBackend>(
    mut model: AttentionRnn<B>,
    train_data: InMemDataset<MetroItem>,
    test_data: InMemDataset<MetroItem>,
    config: &TrainingConfig,
) -> AttentionRnn<B> {
    let dataloader_train = DataLoaderBuilder::new(TrafficBatcher::<B>::new())
        .batch_size(config.batch_size)
        .build(train_data);
    let dataloader_test = DataLoaderBuilder::new(TrafficBatcher::<B::InnerBackend>::new())
        .batch_size(config.batch_size)
        .build(test_data);

    let mut optim = AdamConfig::new().init();

    for epoch in 1..=config.num_epochs {
        for (iteration, batch) in dataloader_train.iter().enumerate() {
            let output = TrainStep::step(&model, batch);
            model = optim.step(config.learning_rate, model, output.grads);

            if iteration % config.print_every == 0 {
                let loss = scalar_loss(output.item.loss);
                info!(epoch, iteration, loss, "train");
            }
        }

        let model_valid = model.valid();
        let mut total = 0.0;
        let mut batches = 0;
        for batch in dataloader_test.iter() {
            let output = ValidStep::step(&model_valid, batch);
            total += scalar_loss(output.loss);
            batches += 1;
        }

        if batches > 0 {
            let loss = total / batches as f32;
            info!(epoch, loss, "valid");
        }
    }

    model
}
