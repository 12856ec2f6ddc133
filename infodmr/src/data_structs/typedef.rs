use arcstr::ArcStr;

/// Genomic coordinate (0-based, half-open intervals).
pub type PosType = u32;
/// Per-position value carried by signals (information content, smoothed
/// score, p-value derived significance).
pub type ScoreType = f64;
/// Chromosome name. Cheap to clone, shared between every record of a
/// partition.
pub type ChrName = ArcStr;
