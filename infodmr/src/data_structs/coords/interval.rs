use std::fmt::Display;

use serde::{
    Deserialize,
    Serialize,
};

use crate::data_structs::typedef::{
    ChrName,
    PosType,
};
use crate::error::{
    DmrError,
    DmrResult,
};

/// Half-open genomic interval `[start, end)` on chromosome `chr`.
///
/// Field order matters: the derived `Ord` compares the chromosome name first
/// and the start position second.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GenomicInterval {
    chr:   ChrName,
    start: PosType,
    end:   PosType,
}

impl GenomicInterval {
    /// Creates a new `GenomicInterval`.
    ///
    /// # Panics
    ///
    /// If `start >= end`. Use [`GenomicInterval::try_new`] for untrusted
    /// input.
    pub fn new(
        chr: impl Into<ChrName>,
        start: PosType,
        end: PosType,
    ) -> Self {
        assert!(
            start < end,
            "Start position must be less than end position"
        );
        Self {
            chr: chr.into(),
            start,
            end,
        }
    }

    /// Creates a new `GenomicInterval`, reporting an empty or inverted
    /// interval as an input shape error.
    pub fn try_new(
        chr: impl Into<ChrName>,
        start: PosType,
        end: PosType,
    ) -> DmrResult<Self> {
        let chr = chr.into();
        if start >= end {
            return Err(DmrError::InputShape(format!(
                "interval {}:{}-{} is empty or inverted",
                chr, start, end
            )));
        }
        Ok(Self { chr, start, end })
    }

    /// Returns the chromosome name.
    pub fn chr(&self) -> &ChrName {
        &self.chr
    }

    /// Returns the start position.
    pub fn start(&self) -> PosType {
        self.start
    }

    /// Returns the end position (exclusive).
    pub fn end(&self) -> PosType {
        self.end
    }

    /// Returns the length of the interval.
    pub fn length(&self) -> PosType {
        self.end - self.start
    }

    /// Checks whether two intervals share at least one base.
    pub fn overlaps(
        &self,
        other: &Self,
    ) -> bool {
        self.chr == other.chr && self.start < other.end && other.start < self.end
    }

    pub fn contains_pos(
        &self,
        pos: PosType,
    ) -> bool {
        self.start <= pos && pos < self.end
    }
}

impl Display for GenomicInterval {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        write!(f, "{}:{}-{}", self.chr, self.start, self.end)
    }
}
