mod dmr;
mod smooth;
mod utils;

use clap::{
    Parser,
    Subcommand,
};
use utils::UtilsArgs;
use wild::ArgsOs;

#[derive(Parser, Debug)]
#[command(
    author = env!("CARGO_PKG_AUTHORS"),
    version = env!("CARGO_PKG_VERSION"),
    about = env!("CARGO_PKG_DESCRIPTION"),
    long_about = None,)]
struct Cli {
    #[command(subcommand)]
    command: MainMenu,
}

#[derive(Subcommand, Debug)]
enum MainMenu {
    /// Call DMRs from information-content tracks.
    Dmr {
        #[clap(flatten)]
        utils: UtilsArgs,
        #[clap(flatten)]
        args:  dmr::DmrArgs,
    },

    /// Smooth a single track with a Gaussian kernel.
    Smooth {
        #[clap(flatten)]
        utils: UtilsArgs,
        #[clap(flatten)]
        args:  smooth::SmoothArgs,
    },
}

fn main() -> anyhow::Result<()> {
    let args: ArgsOs = wild::args_os();
    let cli = Cli::parse_from(args);

    match cli.command {
        MainMenu::Dmr { utils, args } => {
            utils.setup()?;
            args.run(&utils)?;
        },
        MainMenu::Smooth { utils, args } => {
            utils.setup()?;
            args.run(&utils)?;
        },
    }
    Ok(())
}
