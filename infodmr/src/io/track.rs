use std::collections::BTreeMap;
use std::fs::File;
use std::io::{
    Read,
    Write,
};
use std::path::Path;

use anyhow::{
    anyhow,
    Context,
};
use log::debug;
use serde::Deserialize;

use crate::data_structs::typedef::{
    ChrName,
    PosType,
    ScoreType,
};
use crate::data_structs::{
    DmrRecord,
    GenomicInterval,
    IntervalSignal,
    SignalRecord,
};

/// One `chrom start end value` line.
#[derive(Debug, Clone, Deserialize)]
struct TrackRow {
    chrom: String,
    start: PosType,
    end:   PosType,
    value: ScoreType,
}

#[derive(Debug, Clone, Deserialize)]
struct ChromSizeRow {
    chrom: String,
    size:  PosType,
}

fn tsv_reader<R: Read>(reader: R) -> csv::Reader<R> {
    csv::ReaderBuilder::default()
        .delimiter(b'\t')
        .has_headers(false)
        .comment(Some(b'#'))
        .flexible(true)
        .from_reader(reader)
}

fn tsv_writer<W: Write>(writer: W) -> csv::Writer<W> {
    csv::WriterBuilder::default()
        .delimiter(b'\t')
        .has_headers(false)
        .from_writer(writer)
}

fn is_header_line(record: &csv::StringRecord) -> bool {
    record
        .get(0)
        .map(|first| first.starts_with("track") || first.starts_with("browser"))
        .unwrap_or(true)
}

/// Reads a tab separated `chrom start end value` track.
///
/// `#`, `track` and `browser` lines are skipped. Every other row must hold a
/// non-empty interval, and within each chromosome the rows must already be
/// sorted by start and free of overlaps. Chromosomes may be interleaved.
pub fn read_signal<R: Read>(reader: R) -> anyhow::Result<IntervalSignal> {
    let mut records = Vec::new();
    for (line, record) in tsv_reader(reader).records().enumerate() {
        let record = record.with_context(|| format!("malformed track line {}", line + 1))?;
        if is_header_line(&record) {
            continue;
        }
        let row: TrackRow = record
            .deserialize(None)
            .with_context(|| format!("could not parse track line {}", line + 1))?;
        let interval = GenomicInterval::try_new(row.chrom.as_str(), row.start, row.end)
            .with_context(|| format!("invalid interval on track line {}", line + 1))?;
        records.push(SignalRecord::new(interval, row.value));
    }

    let signal = IntervalSignal::try_from_records(records)?;
    debug!(
        "Read {} records on {} chromosomes",
        signal.len(),
        signal.n_chr()
    );
    Ok(signal)
}

pub fn read_signal_path<P: AsRef<Path>>(path: P) -> anyhow::Result<IntervalSignal> {
    let path = path.as_ref();
    let file = File::open(path).with_context(|| format!("could not open {}", path.display()))?;
    read_signal(file).with_context(|| format!("failed to read track {}", path.display()))
}

/// Writes `signal` as a headerless bedGraph-like track.
pub fn write_signal<W: Write>(
    signal: &IntervalSignal,
    writer: W,
) -> anyhow::Result<()> {
    let mut writer = tsv_writer(writer);
    for record in signal.iter() {
        writer.serialize((
            record.interval.chr().as_str(),
            record.interval.start(),
            record.interval.end(),
            format!("{}", record.value),
        ))?;
    }
    writer.flush()?;
    Ok(())
}

pub fn write_signal_path<P: AsRef<Path>>(
    signal: &IntervalSignal,
    path: P,
) -> anyhow::Result<()> {
    let path = path.as_ref();
    let file = File::create(path).with_context(|| format!("could not create {}", path.display()))?;
    write_signal(signal, file)
}

/// Writes DMRs as `chrom start end score`, scores with six decimals.
pub fn write_dmrs<W: Write>(
    dmrs: &[DmrRecord],
    writer: W,
) -> anyhow::Result<()> {
    let mut writer = tsv_writer(writer);
    for dmr in dmrs {
        writer.serialize((
            dmr.interval.chr().as_str(),
            dmr.interval.start(),
            dmr.interval.end(),
            format!("{:.6}", dmr.score),
        ))?;
    }
    writer.flush()?;
    Ok(())
}

pub fn write_dmrs_path<P: AsRef<Path>>(
    dmrs: &[DmrRecord],
    path: P,
) -> anyhow::Result<()> {
    let path = path.as_ref();
    let file = File::create(path).with_context(|| format!("could not create {}", path.display()))?;
    write_dmrs(dmrs, file)
}

/// Reads `chrom size` pairs. Extra columns (as in a FASTA index) are
/// ignored.
pub fn read_chrom_sizes<R: Read>(reader: R) -> anyhow::Result<BTreeMap<ChrName, PosType>> {
    let mut sizes = BTreeMap::new();
    for (line, record) in tsv_reader(reader).records().enumerate() {
        let record = record.with_context(|| format!("malformed sizes line {}", line + 1))?;
        if record.len() < 2 {
            return Err(anyhow!(
                "sizes line {} needs at least two columns",
                line + 1
            ));
        }
        let row: ChromSizeRow = csv::StringRecord::from(vec![&record[0], &record[1]])
            .deserialize(None)
            .with_context(|| format!("could not parse sizes line {}", line + 1))?;
        sizes.insert(ChrName::from(row.chrom), row.size);
    }
    Ok(sizes)
}

pub fn read_chrom_sizes_path<P: AsRef<Path>>(path: P) -> anyhow::Result<BTreeMap<ChrName, PosType>> {
    let path = path.as_ref();
    let file = File::open(path).with_context(|| format!("could not open {}", path.display()))?;
    read_chrom_sizes(file).with_context(|| format!("failed to read sizes {}", path.display()))
}
