use std::path::PathBuf;

use anyhow::anyhow;
use clap::{
    ArgAction,
    Args,
};
use console::style;
use dialoguer::Confirm;
use glob::glob;
use indicatif::{
    ProgressBar,
    ProgressStyle,
};
use infodmr::utils::{
    n_threads,
    NUM_THREADS_ENV,
};
use log::{
    debug,
    LevelFilter,
};

#[derive(Args, Debug, Clone)]
pub(crate) struct UtilsArgs {
    #[arg(
        long,
        default_value_t = 0,
        help_heading = "UTILS",
        help = "Number of worker threads. 0 uses all available cores."
    )]
    pub threads:  usize,
    #[arg(
        long,
        default_value_t = false,
        help_heading = "UTILS",
        help = "Display a progress bar."
    )]
    pub progress: bool,
    #[arg(
        short,
        long,
        action = ArgAction::Count,
        help_heading = "UTILS",
        help = "Increase log verbosity (-v info, -vv debug, -vvv trace). RUST_LOG overrides it."
    )]
    pub verbose:  u8,
    #[arg(
        short,
        long,
        default_value_t = false,
        help_heading = "UTILS",
        help = "Automatically confirm selected paths."
    )]
    pub force:    bool,
}

impl UtilsArgs {
    /// Initialises logging and the worker pool size. Must run before any
    /// library call touches the thread pool.
    pub fn setup(&self) -> anyhow::Result<()> {
        let level = match self.verbose {
            0 => LevelFilter::Warn,
            1 => LevelFilter::Info,
            2 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        };
        let mut builder = pretty_env_logger::formatted_builder();
        builder.filter_level(level);
        if let Ok(filters) = std::env::var("RUST_LOG") {
            builder.parse_filters(&filters);
        }
        builder.try_init()?;

        if self.threads > 0 {
            std::env::set_var(NUM_THREADS_ENV, self.threads.to_string());
        }
        debug!("Worker pool has {} threads", n_threads());
        Ok(())
    }

    /// Asks the user to confirm `prompt` unless `--force` was given.
    pub fn confirm(
        &self,
        prompt: String,
    ) -> anyhow::Result<()> {
        if self.force {
            return Ok(());
        }
        let confirmed = Confirm::new()
            .with_prompt(prompt)
            .default(true)
            .interact()
            .unwrap_or(false);
        if !confirmed {
            println!("{}", style("Process aborted by the user.").red());
            return Err(anyhow!("User aborted the process."));
        }
        Ok(())
    }

    pub fn pbar(
        &self,
        total: usize,
    ) -> anyhow::Result<ProgressBar> {
        if self.progress {
            init_pbar(total)
        }
        else {
            Ok(ProgressBar::hidden())
        }
    }
}

pub(crate) fn init_pbar(total: usize) -> anyhow::Result<ProgressBar> {
    let progress_bar = ProgressBar::new(total as u64);
    progress_bar.set_style(
        ProgressStyle::default_bar()
            .template(
                "{spinner:.green} [{elapsed_precise}, ETA: {eta}] [{bar:40.cyan/blue}] \
                 {pos:>5.green}/{len:5} {msg}",
            )?
            .progress_chars("#>-"),
    );
    progress_bar.set_message("Processing...");
    Ok(progress_bar)
}

/// Expands `*` and `?` patterns. Other paths are kept as given.
pub(crate) fn expand_wildcards(paths: &[String]) -> Vec<PathBuf> {
    let mut expanded_paths = Vec::new();
    for path in paths {
        if path.contains('*') || path.contains('?') {
            match glob(path) {
                Ok(matches) => expanded_paths.extend(matches.filter_map(Result::ok)),
                Err(e) => eprintln!("Error processing wildcard '{}': {}", path, e),
            }
        }
        else {
            expanded_paths.push(PathBuf::from(path));
        }
    }
    expanded_paths
}

/// Fails on the first path that is not an existing file.
pub(crate) fn check_files(paths: &[PathBuf]) -> anyhow::Result<()> {
    for path in paths {
        if !path.is_file() {
            eprintln!("Path {} is not a file.", style(path.display()).red());
            return Err(anyhow!("{} is not a file", path.display()));
        }
    }
    Ok(())
}

/// Sample label used in output file names: the file name up to its first
/// dot.
pub(crate) fn sample_name(path: &std::path::Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().to_string())
        .and_then(|name| name.split('.').next().map(str::to_string))
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| "sample".to_string())
}
