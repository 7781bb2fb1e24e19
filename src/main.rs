use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use log::LevelFilter;
use stimgen::{Config, Xlen};

#[derive(Parser, Debug)]
#[command(version, about = "Build imem/dmem stim files from a C source or ELF image")]
pub struct Args {
    /// C source, ELF file, or extension-less executable
    filename: PathBuf,

    /// Register width of the target toolchain
    #[arg(long, value_enum, default_value = "32")]
    riscv_xlen: Xlen,

    /// Remove the build directory first
    #[arg(long)]
    clean: bool,

    /// Echo toolchain commands and per-section details
    #[arg(short, long)]
    verbose: bool,

    /// Directory containing common/crt0.S and common/link.ld
    #[arg(long, default_value = ".")]
    build_root: PathBuf,

    /// Build artifacts [default: <BUILD_ROOT>/build]
    #[arg(long)]
    out_dir: Option<PathBuf>,

    /// Where the .hex stim files go
    #[arg(long, default_value = "stims")]
    stim_dir: PathBuf,

    /// Toolchain prefix [default: riscv<XLEN>-unknown-elf-]
    #[arg(long)]
    prefix: Option<String>,

    /// Print an annotated hex dump of the extracted sections
    #[arg(short, long)]
    dump: bool,

    /// Demangle symbols in the dump
    #[arg(long)]
    demangle: bool,
}

impl From<Args> for Config {
    fn from(args: Args) -> Self {
        let out_dir = args
            .out_dir
            .unwrap_or_else(|| args.build_root.join("build"));
        Config {
            input: args.filename,
            xlen: args.riscv_xlen,
            prefix: args.prefix,
            build_root: args.build_root,
            out_dir,
            stim_dir: args.stim_dir,
            clean: args.clean,
            verbose: args.verbose,
            dump: args.dump,
            demangle: args.demangle,
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    env_logger::Builder::new()
        .filter_level(if args.verbose {
            LevelFilter::Debug
        } else {
            LevelFilter::Info
        })
        .parse_default_env()
        .init();

    let config = Config::from(args);
    stimgen::run(&config)
        .with_context(|| format!("stim generation failed for {}", config.input.display()))?;
    Ok(())
}
