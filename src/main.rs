use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;
use clap_stdin::MaybeStdin;
use log::info;

use jackc::driver::{self, Emit, Options};

#[derive(Parser, Debug)]
#[command(version, about = "Compile Jack classes into stack-machine code")]
struct Args {
    /// A .jack file or a directory of .jack files
    #[arg(required_unless_present = "source")]
    input: Option<PathBuf>,

    /// Output directory, defaults to the directory of each source file
    out_dir: Option<PathBuf>,

    /// Compile one class given inline, or read from stdin with `-`, and print the result
    #[arg(short = 'e', long, conflicts_with_all = ["input", "out_dir"])]
    source: Option<MaybeStdin<String>>,

    /// What to produce for each class
    #[arg(long, value_enum, default_value_t = Emit::Vm)]
    emit: Emit,

    /// Keep compiling the remaining files after one fails
    #[arg(long)]
    keep_going: bool,

    /// Log every compiled file and subroutine
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let level = if args.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    if let Some(source) = args.source {
        let output = args
            .emit
            .render(source.as_bytes())
            .context("failed to compile source")?;
        print!("{output}");
        return Ok(());
    }

    let input = args.input.context("no input given")?;
    let options = Options {
        emit: args.emit,
        out_dir: args.out_dir,
        keep_going: args.keep_going,
    };

    let summary = driver::run(&input, &options)
        .with_context(|| format!("failed to compile {}", input.display()))?;
    info!("wrote {} file(s)", summary.written.len());

    if !summary.is_success() {
        for e in &summary.failed {
            eprintln!("error: {e}");
        }
        bail!(
            "{} of {} file(s) failed",
            summary.failed.len(),
            summary.failed.len() + summary.written.len()
        );
    }
    Ok(())
}
