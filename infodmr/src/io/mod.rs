//! Reading and writing of tab separated interval tracks.
//!
//! Signals and DMRs use the same four column layout, `chrom start end
//! value`, without a header. Chromosome sizes are read from `chrom size`
//! files; FASTA index files work as well.
mod track;

pub use track::{
    read_chrom_sizes,
    read_chrom_sizes_path,
    read_signal,
    read_signal_path,
    write_dmrs,
    write_dmrs_path,
    write_signal,
    write_signal_path,
};
