use burn::backend::{Autodiff, NdArray};
use burn::module::Module;
use burn::record::{BinFileRecorder, FullPrecisionSettings, Recorder};
use tracing::info;

use metrots::data::metroitem::{train_test_split, window_items, MetroFrame};
use metrots::data::scaler::StandardScaler;
use metrots::models::attention_rnn::AttentionRnnConfig;
use metrots::train::{train, TrainingConfig};

type TrainBackend = Autodiff<NdArray<f32>>;

const HORIZON: usize = 48;

fn main() {
    tracing_subscriber::fmt::init();

    let path = std::env::args().nth(1).unwrap_or_else(|| "train.csv".to_string());

    let frame = MetroFrame::from_csv(&path).expect("failed to load the traffic table");
    info!(rows = frame.rows.len(), columns = frame.columns.len(), "loaded");

    let (primary, secondary, targets) = frame.split_streams(HORIZON);

    let (primary_train, primary_test) = train_test_split(&primary, 0.1);
    let (secondary_train, secondary_test) = train_test_split(&secondary, 0.1);
    let (target_train, target_test) = train_test_split(&targets, 0.1);

    // Statistics come from the training partition only.
    let mut scaler = StandardScaler::new();
    let mut scaled_train = scaler.fit_transform(vec![primary_train, secondary_train]);
    let mut scaled_test = scaler.transform(vec![primary_test, secondary_test]);
    let secondary_train = scaled_train.pop().unwrap();
    let primary_train = scaled_train.pop().unwrap();
    let secondary_test = scaled_test.pop().unwrap();
    let primary_test = scaled_test.pop().unwrap();

    let train_data = window_items(&primary_train, &secondary_train, &target_train, HORIZON, 1);
    let test_data = window_items(&primary_test, &secondary_test, &target_test, HORIZON, 1);

    let model = AttentionRnnConfig::new(frame.columns.len(), 1, HORIZON).init::<TrainBackend>();

    let config = TrainingConfig::new();
    let model = train(model, train_data, test_data, &config);

    let recorder = BinFileRecorder::<FullPrecisionSettings>::new();
    recorder
        .record(model.into_record(), "model".into())
        .expect("failed to save the trained model");
    info!("model saved");
}
