use std::path::PathBuf;

use clap::Args;
use console::style;
use infodmr::io::{
    read_signal_path,
    write_signal_path,
};
use infodmr::tools::smooth::{
    Smoother,
    DEFAULT_BANDWIDTH,
};

use crate::utils::{
    check_files,
    UtilsArgs,
};

#[derive(Args, Debug, Clone)]
pub(crate) struct SmoothArgs {
    #[arg(short = 'i', long, required = true, help = "Input signal track.")]
    input:       PathBuf,
    #[arg(short = 'o', long, required = true, help = "Output bedGraph path.")]
    output:      PathBuf,
    #[arg(
        short = 'b',
        long,
        default_value_t = DEFAULT_BANDWIDTH,
        help = "Gaussian kernel bandwidth in bases."
    )]
    bandwidth:   f64,
    #[arg(
        short = 'c',
        long,
        value_delimiter = ',',
        help = "Comma separated chromosomes to keep [default: all]."
    )]
    chromosomes: Vec<String>,
}

impl SmoothArgs {
    pub fn run(
        &self,
        utils: &UtilsArgs,
    ) -> anyhow::Result<()> {
        check_files(std::slice::from_ref(&self.input))?;
        if self.output.exists() {
            utils.confirm(format!(
                "Output {} exists. Overwrite?",
                self.output.display()
            ))?;
        }

        let mut signal = read_signal_path(&self.input)?;
        if !self.chromosomes.is_empty() {
            signal = signal.restrict_to_chromosomes(self.chromosomes.as_slice());
        }
        let smoothed = Smoother::new(self.bandwidth).smooth(&signal)?;
        write_signal_path(&smoothed, &self.output)?;

        println!(
            "{} {} of {} positions to {}",
            style("Smoothed").green(),
            smoothed.len(),
            signal.len(),
            style(self.output.display()).bold()
        );
        Ok(())
    }
}
