use std::fmt::Display;

use serde::{
    Deserialize,
    Serialize,
};

use super::typedef::ScoreType;
use super::GenomicInterval;

/// A differentially methylated region: a closed interval and the score mass
/// of the signal inside it, normalised by the aggregation unit size.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DmrRecord {
    pub interval: GenomicInterval,
    pub score:    ScoreType,
}

impl DmrRecord {
    pub fn new(
        interval: GenomicInterval,
        score: ScoreType,
    ) -> Self {
        Self { interval, score }
    }

    pub fn length(&self) -> u32 {
        self.interval.length()
    }
}

impl Display for DmrRecord {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        write!(f, "{} ({:.3})", self.interval, self.score)
    }
}
