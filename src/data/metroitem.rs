use burn::data::dataloader::batcher::Batcher;
use burn::data::dataset::InMemDataset;
use burn::tensor::backend::Backend;
use burn::tensor::{Data, Shape, Tensor};
use serde::{Deserialize, Serialize};
use std::io;

use crate::data::batchitem::TrafficBatch;

const TARGET_COLUMN: &str = "traffic_volume";
const TIMESTAMP_COLUMN: &str = "date_time";

/// Numeric view of the metro traffic table, timestamp column dropped.
#[derive(Debug, Clone)]
pub struct MetroFrame {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<f32>>,
    pub target_index: usize,
}

impl MetroFrame {
    pub fn from_csv(path: &str) -> Result<Self, io::Error> {
        let mut reader = csv::Reader::from_path(path)
            .map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err))?;

        let headers = reader
            .headers()
            .map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err))?
            .clone();

        let kept: Vec<usize> = headers
            .iter()
            .enumerate()
            .filter(|(_, name)| *name != TIMESTAMP_COLUMN)
            .map(|(idx, _)| idx)
            .collect();

        let columns: Vec<String> = kept.iter().map(|idx| headers[*idx].to_string()).collect();
        let target_index = columns
            .iter()
            .position(|name| name == TARGET_COLUMN)
            .ok_or_else(|| {
                io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!("column '{}' not found", TARGET_COLUMN),
                )
            })?;

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record.map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err))?;
            let row: Result<Vec<f32>, io::Error> = kept
                .iter()
                .map(|idx| {
                    record[*idx].parse::<f32>().map_err(|err| {
                        io::Error::new(io::ErrorKind::InvalidData, err)
                    })
                })
                .collect();
            rows.push(row?);
        }

        Ok(MetroFrame {
            columns,
            rows,
            target_index,
        })
    }

    /// Splits the table into the two model input streams plus the target
    /// series. The primary stream keeps every column (traffic volume
    /// included) over rows `[..len - horizon]`; the secondary stream drops
    /// the target column and covers rows `[horizon..]`, aligned with the
    /// targets it helps predict.
    pub fn split_streams(&self, horizon: usize) -> (Vec<Vec<f32>>, Vec<Vec<f32>>, Vec<f32>) {
        assert!(
            self.rows.len() > horizon,
            "frame has {} rows, need more than the horizon {}",
            self.rows.len(),
            horizon
        );

        let primary: Vec<Vec<f32>> = self.rows[..self.rows.len() - horizon].to_vec();
        let secondary: Vec<Vec<f32>> = self.rows[horizon..]
            .iter()
            .map(|row| {
                row.iter()
                    .enumerate()
                    .filter(|(idx, _)| *idx != self.target_index)
                    .map(|(_, value)| *value)
                    .collect()
            })
            .collect();
        let targets: Vec<f32> = self.rows[horizon..]
            .iter()
            .map(|row| row[self.target_index])
            .collect();

        (primary, secondary, targets)
    }
}

/// Ordered split, no shuffling. Windowed time series must keep temporal
/// order, so the test partition is always the tail of the data.
pub fn train_test_split<T: Clone>(rows: &[T], test_fraction: f64) -> (Vec<T>, Vec<T>) {
    assert!(
        test_fraction > 0.0 && test_fraction < 1.0,
        "test fraction {} outside (0, 1)",
        test_fraction
    );

    let test_len = ((rows.len() as f64) * test_fraction) as usize;
    let pivot = rows.len() - test_len;

    (rows[..pivot].to_vec(), rows[pivot..].to_vec())
}

/// One training window over the aligned streams.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct MetroItem {
    pub past_features: Vec<Vec<f32>>,     // [W, F]
    pub future_covariates: Vec<Vec<f32>>, // [W, F - 1]
    pub future_target: Vec<f32>,          // [Ty]
}

pub fn window_items(
    primary: &[Vec<f32>],
    secondary: &[Vec<f32>],
    targets: &[f32],
    window: usize,
    stride: usize,
) -> InMemDataset<MetroItem> {
    assert!(window > 0, "window length must be positive");
    assert!(stride > 0, "stride must be positive");
    assert_eq!(
        primary.len(),
        secondary.len(),
        "streams disagree on row count"
    );
    assert_eq!(secondary.len(), targets.len(), "targets misaligned");

    let mut items = Vec::new();
    let mut start = 0;
    while start + window <= primary.len() {
        items.push(MetroItem {
            past_features: primary[start..start + window].to_vec(),
            future_covariates: secondary[start..start + window].to_vec(),
            future_target: targets[start..start + window].to_vec(),
        });
        start += stride;
    }

    InMemDataset::new(items)
}

pub struct TrafficBatcher<B: Backend> {
    _backend: std::marker::PhantomData<B>,
}

impl<B: Backend> TrafficBatcher<B> {
    pub fn new() -> Self {
        Self {
            _backend: std::marker::PhantomData,
        }
    }
}

fn matrix_tensor<B: Backend>(rows: &[Vec<f32>]) -> Tensor<B, 3> {
    let height = rows.len();
    let width = rows[0].len();
    let flat: Vec<f32> = rows.iter().flatten().copied().collect();

    let data = Data::new(flat, Shape::new([height, width]));
    let tensor: Tensor<B, 2> = Tensor::from_data(data.convert());

    tensor.unsqueeze()
}

impl<B: Backend> Batcher<MetroItem, TrafficBatch<B>> for TrafficBatcher<B> {
    fn batch(&self, items: Vec<MetroItem>) -> TrafficBatch<B> {
        let past: Vec<Tensor<B, 3>> = items
            .iter()
            .map(|item| matrix_tensor(&item.past_features))
            .collect();
        let future: Vec<Tensor<B, 3>> = items
            .iter()
            .map(|item| matrix_tensor(&item.future_covariates))
            .collect();
        let targets: Vec<Tensor<B, 2>> = items
            .iter()
            .map(|item| {
                let len = item.future_target.len();
                let data = Data::new(item.future_target.clone(), Shape::new([len]));
                let tensor: Tensor<B, 1> = Tensor::from_data(data.convert());
                tensor.reshape([1, len])
            })
            .collect();

        TrafficBatch {
            past_features: Tensor::cat(past, 0),
            future_covariates: Tensor::cat(future, 0),
            future_target: Tensor::cat(targets, 0),
        }
    }
}
