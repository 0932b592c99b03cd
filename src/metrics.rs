//! Per-epoch training history.
//!
//! One [`EpochRecord`] is kept per completed epoch. The history can be exported as CSV
//! (`epoch,epsilon,mean_loss,avg_return,transitions,completed_episodes`); epochs without
//! an evaluation leave `avg_return` empty.

use serde::{Serialize, Deserialize};
use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::error::Result;

/// What happened during one epoch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpochRecord {
    pub epoch: usize,
    pub epsilon: f32,
    pub mean_loss: f32,
    pub avg_return: Option<f32>,
    pub transitions: usize,
    pub completed_episodes: usize,
}

/// Ordered list of epoch records.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrainingHistory {
    records: Vec<EpochRecord>,
}

impl TrainingHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, record: EpochRecord) {
        self.records.push(record);
    }

    pub fn records(&self) -> &[EpochRecord] {
        &self.records
    }

    pub fn last(&self) -> Option<&EpochRecord> {
        self.records.last()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Mean loss of every epoch, in order.
    pub fn losses(&self) -> Vec<f32> {
        self.records.iter().map(|r| r.mean_loss).collect()
    }

    /// `(epoch, avg_return)` for every epoch that ran an evaluation.
    pub fn eval_returns(&self) -> Vec<(usize, f32)> {
        self.records
            .iter()
            .filter_map(|r| r.avg_return.map(|ret| (r.epoch, ret)))
            .collect()
    }

    pub fn best_return(&self) -> Option<f32> {
        self.eval_returns()
            .into_iter()
            .map(|(_, ret)| ret)
            .fold(None, |best, ret| Some(best.map_or(ret, |b: f32| b.max(ret))))
    }

    /// Trailing moving average of the epoch losses. Entry `i` averages epochs
    /// `i + 1 - window ..= i`, using fewer values at the start.
    pub fn smoothed_losses(&self, window: usize) -> Vec<f32> {
        let window = window.max(1);
        let losses = self.losses();
        (0..losses.len())
            .map(|i| {
                let from = (i + 1).saturating_sub(window);
                let slice = &losses[from..=i];
                slice.iter().sum::<f32>() / slice.len() as f32
            })
            .collect()
    }

    /// Write the history as CSV with a header row.
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<()> {
        let mut wtr = csv::Writer::from_writer(writer);
        for record in &self.records {
            wtr.serialize(record)?;
        }
        wtr.flush()?;
        Ok(())
    }

    pub fn save_csv(&self, path: impl AsRef<Path>) -> Result<()> {
        self.write_csv(File::create(path)?)
    }
}
