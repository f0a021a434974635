pub type FeatureMatrix = Vec<Vec<f32>>;

#[derive(Debug, Clone, Copy)]
struct ColumnStats {
    mean: f32,
    std: f32,
}

/// Per-column standardization over a list of feature matrices, one stats
/// table per matrix. Must be fit on the training partition only and then
/// applied unchanged to the test partition.
#[derive(Debug, Clone)]
pub struct StandardScaler {
    stats: Vec<Vec<ColumnStats>>,
}

impl StandardScaler {
    pub fn new() -> Self {
        Self { stats: Vec::new() }
    }

    pub fn fit(&mut self, streams: &[FeatureMatrix]) {
        self.stats = streams.iter().map(|rows| Self::column_stats(rows)).collect();
    }

    pub fn fit_transform(&mut self, streams: Vec<FeatureMatrix>) -> Vec<FeatureMatrix> {
        self.fit(&streams);
        self.transform(streams)
    }

    pub fn transform(&self, streams: Vec<FeatureMatrix>) -> Vec<FeatureMatrix> {
        assert_eq!(
            streams.len(),
            self.stats.len(),
            "scaler was fit on {} streams, got {}",
            self.stats.len(),
            streams.len()
        );

        streams
            .into_iter()
            .zip(self.stats.iter())
            .map(|(rows, stats)| {
                rows.into_iter()
                    .map(|row| {
                        assert_eq!(
                            row.len(),
                            stats.len(),
                            "row has {} columns, scaler was fit on {}",
                            row.len(),
                            stats.len()
                        );
                        row.iter()
                            .zip(stats.iter())
                            .map(|(value, stat)| (value - stat.mean) / stat.std)
                            .collect()
                    })
                    .collect()
            })
            .collect()
    }

    fn column_stats(rows: &[Vec<f32>]) -> Vec<ColumnStats> {
        assert!(!rows.is_empty(), "cannot fit scaler on an empty matrix");

        let count = rows.len() as f32;
        let width = rows[0].len();

        (0..width)
            .map(|col| {
                let mean = rows.iter().map(|row| row[col]).sum::<f32>() / count;
                let variance = rows
                    .iter()
                    .map(|row| {
                        let centered = row[col] - mean;
                        centered * centered
                    })
                    .sum::<f32>()
                    / count;
                let std = (variance + 1e-5).sqrt();

                ColumnStats { mean, std }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fit_transform_standardizes_each_column() {
        let rows: FeatureMatrix = vec![vec![1.0, 100.0], vec![2.0, 200.0], vec![3.0, 300.0]];

        let mut scaler = StandardScaler::new();
        let scaled = scaler.fit_transform(vec![rows]);
        let scaled = &scaled[0];

        for col in 0..2 {
            let mean: f32 = scaled.iter().map(|row| row[col]).sum::<f32>() / 3.0;
            let var: f32 = scaled
                .iter()
                .map(|row| (row[col] - mean) * (row[col] - mean))
                .sum::<f32>()
                / 3.0;

            assert!(mean.abs() < 1e-5);
            assert!((var - 1.0).abs() < 1e-2);
        }
    }

    #[test]
    fn transform_reuses_training_statistics() {
        let train: FeatureMatrix = vec![vec![0.0], vec![2.0]];
        let test: FeatureMatrix = vec![vec![4.0]];

        let mut scaler = StandardScaler::new();
        scaler.fit(&[train]);
        let scaled = scaler.transform(vec![test]);

        // Train mean 1, std 1: the test value 4 lands at 3, not at its own
        // z-score of 0.
        assert!((scaled[0][0][0] - 3.0).abs() < 1e-2);
    }

    #[test]
    #[should_panic(expected = "scaler was fit on")]
    fn transform_rejects_stream_count_mismatch() {
        let mut scaler = StandardScaler::new();
        scaler.fit(&[vec![vec![1.0]]]);
        scaler.transform(vec![vec![vec![1.0]], vec![vec![2.0]]]);
    }
}
