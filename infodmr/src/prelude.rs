pub use crate::data_structs::typedef::{
    ChrName,
    PosType,
    ScoreType,
};
pub use crate::data_structs::{
    ChromSignal,
    DmrRecord,
    GenomicInterval,
    IntervalSignal,
    SignalRecord,
    WeightedCoverage,
};
pub use crate::error::{
    DmrError,
    DmrResult,
};
pub use crate::io::{
    read_chrom_sizes_path,
    read_signal_path,
    write_dmrs_path,
    write_signal_path,
};
#[cfg(feature = "tools")]
pub use crate::tools::{
    null_model::{
        MixtureFitConfig,
        NullModel,
        PValue,
    },
    pipeline::{
        DmrPipeline,
        PipelineConfig,
        PipelineOutput,
    },
    significance::ScoreTransformer,
    smooth::Smoother,
    threshold::MorphologicalThresholder,
};
