use std::path::{
    Path,
    PathBuf,
};

use anyhow::{
    anyhow,
    Context,
};
use clap::Args;
use console::style;
use infodmr::io::{
    read_chrom_sizes_path,
    read_signal_path,
    write_dmrs_path,
    write_signal_path,
};
use infodmr::tools::null_model::{
    MixtureFitConfig,
    NullModel,
};
use infodmr::tools::pipeline::{
    default_chromosomes,
    DmrPipeline,
    PipelineConfig,
    PipelineOutput,
};
use infodmr::tools::significance::DEFAULT_CEILING;
use infodmr::tools::smooth::DEFAULT_BANDWIDTH;
use infodmr::tools::threshold::{
    DEFAULT_THRESHOLD,
    DEFAULT_UNIT_SIZE,
};
use itertools::Itertools;
use log::info;

use crate::utils::{
    check_files,
    expand_wildcards,
    sample_name,
    UtilsArgs,
};

#[derive(Args, Debug, Clone)]
pub(crate) struct DmrArgs {
    #[arg(
        value_parser,
        short = 'i',
        long = "input",
        num_args = 1..,
        required = true,
        help = "Signal tracks of the test samples (chrom, start, end, score)."
    )]
    tests:  Vec<String>,
    #[arg(
        value_parser,
        short = 'n',
        long = "nulls",
        num_args = 1..,
        help = "Signal tracks of reference-vs-reference comparisons. Without them \
                the null is fitted from each test sample."
    )]
    nulls:  Vec<String>,
    #[arg(
        short = 'o',
        long,
        required = true,
        help = "Prefix for the generated output files."
    )]
    output: PathBuf,

    #[arg(
        short = 'c',
        long,
        value_delimiter = ',',
        help_heading = "SIGNAL ARGS",
        help = "Comma separated chromosomes to process [default: chr1..chr22]."
    )]
    chromosomes:    Vec<String>,
    #[arg(
        short = 'b',
        long,
        default_value_t = DEFAULT_BANDWIDTH,
        help_heading = "SIGNAL ARGS",
        help = "Gaussian kernel bandwidth in bases."
    )]
    bandwidth:      f64,
    #[arg(
        long,
        help_heading = "SIGNAL ARGS",
        help = "Morphological closing length in bases [default: bandwidth]."
    )]
    closing_length: Option<u32>,
    #[arg(
        short = 't',
        long,
        default_value_t = DEFAULT_THRESHOLD,
        help_heading = "SIGNAL ARGS",
        help = "Significance score a position must exceed to seed a DMR."
    )]
    threshold:      f64,
    #[arg(
        long,
        default_value_t = DEFAULT_CEILING,
        help_heading = "SIGNAL ARGS",
        help = "Upper cap of the significance score."
    )]
    ceiling:        f64,
    #[arg(
        long,
        default_value_t = DEFAULT_UNIT_SIZE,
        help_heading = "SIGNAL ARGS",
        help = "Divisor of the aggregated score mass of a DMR."
    )]
    unit_size:      f64,
    #[arg(
        short = 's',
        long,
        help_heading = "SIGNAL ARGS",
        help = "Chromosome sizes (chrom<TAB>size or .fai) used to clip DMRs."
    )]
    chrom_sizes:    Option<PathBuf>,
    #[arg(
        long,
        default_value_t = 1000,
        help_heading = "MIXTURE ARGS",
        help = "Iteration cap of the mixture fit."
    )]
    max_iters:      u64,
    #[arg(
        long,
        default_value_t = false,
        help = "Also write the smoothed and significance tracks."
    )]
    emit_tracks:    bool,
}

impl DmrArgs {
    fn pipeline_config(&self) -> anyhow::Result<PipelineConfig> {
        let chromosomes = if self.chromosomes.is_empty() {
            default_chromosomes()
        }
        else {
            self.chromosomes.clone()
        };
        let chrom_sizes = match &self.chrom_sizes {
            Some(path) => read_chrom_sizes_path(path)?,
            None => Default::default(),
        };
        Ok(PipelineConfig::default()
            .with_chromosomes(chromosomes)
            .with_bandwidth(self.bandwidth)
            .with_closing_length(self.closing_length)
            .with_threshold(self.threshold)
            .with_ceiling(self.ceiling)
            .with_unit_size(self.unit_size)
            .with_chrom_sizes(chrom_sizes)
            .with_emit_intermediates(self.emit_tracks)
            .with_mixture(MixtureFitConfig::default().with_max_iters(self.max_iters)))
    }

    fn output_path(
        &self,
        sample: &str,
        suffix: &str,
    ) -> PathBuf {
        let prefix = self.output.to_string_lossy();
        PathBuf::from(format!("{}.{}.{}", prefix, sample, suffix))
    }

    fn write_output(
        &self,
        sample: &str,
        output: &PipelineOutput,
    ) -> anyhow::Result<()> {
        let dmr_path = self.output_path(sample, "dmr.tsv");
        write_dmrs_path(&output.dmrs, &dmr_path)?;
        info!("Wrote {} DMRs to {}", output.dmrs.len(), dmr_path.display());

        if let Some(smoothed) = &output.smoothed {
            write_signal_path(smoothed, self.output_path(sample, "smoothed.bedgraph"))?;
        }
        if let Some(significance) = &output.significance {
            write_signal_path(significance, self.output_path(sample, "sqs.bedgraph"))?;
        }
        Ok(())
    }

    fn run_sample(
        &self,
        pipeline: &DmrPipeline,
        path: &Path,
        null_model: Option<&NullModel>,
    ) -> anyhow::Result<PipelineOutput> {
        let test = read_signal_path(path)?;
        let output = match null_model {
            Some(null_model) => pipeline.run_with_null_model(&test, null_model),
            None => pipeline.run_without_replicates(&test),
        };
        output.with_context(|| format!("DMR calling failed for {}", path.display()))
    }

    pub fn run(
        &self,
        utils: &UtilsArgs,
    ) -> anyhow::Result<()> {
        let test_paths = expand_wildcards(&self.tests);
        let null_paths = expand_wildcards(&self.nulls);

        utils.confirm(format!(
            "Do you want to proceed with the following paths?\n\nTest samples: {:?}\nNull \
             comparisons: {:?}\nOutput: {:?}",
            test_paths, null_paths, self.output
        ))?;

        if test_paths.is_empty() {
            return Err(anyhow!("Test sample files must not be empty"));
        }
        check_files(&test_paths)?;
        check_files(&null_paths)?;
        if self.output.is_dir() {
            return Err(anyhow!(
                "Output prefix {} is a directory",
                self.output.display()
            ));
        }
        let names = test_paths.iter().map(|p| sample_name(p)).collect_vec();
        if let Some(dup) = names.iter().duplicates().next() {
            return Err(anyhow!("Sample name '{}' occurs more than once", dup));
        }

        let pipeline = self.pipeline_config()?.finish();
        let nulls = null_paths
            .iter()
            .map(read_signal_path)
            .collect::<anyhow::Result<Vec<_>>>()?;
        let null_model = if nulls.is_empty() {
            info!("No null comparisons given, fitting a mixture null per sample");
            None
        }
        else {
            let null_model = pipeline
                .replicate_null_model(&nulls)
                .context("could not build the null model from the replicate comparisons")?;
            info!(
                "Built an empirical null from {} replicate comparisons",
                nulls.len()
            );
            Some(null_model)
        };

        let progress_bar = utils.pbar(test_paths.len())?;
        let mut total = 0usize;
        for (path, name) in test_paths.iter().zip(names.iter()) {
            progress_bar.set_message(format!("{}", style(name).blue()));
            let output = self.run_sample(&pipeline, path, null_model.as_ref())?;
            total += output.dmrs.len();
            self.write_output(name, &output)?;
            progress_bar.inc(1);
        }
        progress_bar.finish();

        println!(
            "{} {} DMRs in {} samples.",
            style("Found").green(),
            style(total).green().bold(),
            test_paths.len()
        );
        Ok(())
    }
}
