use serde::{Serialize, Deserialize};

/// How epsilon moves from `start` towards `end`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum DecayKind {
    /// epsilon = start * decay^(epoch - 1)
    #[default]
    Exponential,
    /// epsilon = start - decay * (epoch - 1)
    Linear,
}

/// Per-epoch exploration rate, non-increasing in the epoch index and floored at `end`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct EpsilonSchedule {
    pub start: f32,
    pub end: f32,
    pub decay: f32,
    pub kind: DecayKind,
}

impl EpsilonSchedule {
    pub fn new(start: f32, end: f32, decay: f32, kind: DecayKind) -> Self {
        EpsilonSchedule { start, end, decay, kind }
    }

    /// Epsilon for a 1-based `epoch`.
    pub fn value(&self, epoch: usize) -> f32 {
        let elapsed = epoch.saturating_sub(1);
        let raw = match self.kind {
            DecayKind::Exponential => self.start * self.decay.powi(elapsed.min(i32::MAX as usize) as i32),
            DecayKind::Linear => self.start - self.decay * elapsed as f32,
        };
        raw.max(self.end).min(self.start)
    }
}
