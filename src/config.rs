use std::path::PathBuf;

use clap::ValueEnum;

/// Register width of the target, selecting the cross toolchain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Xlen {
    #[default]
    #[value(name = "32")]
    Rv32,
    #[value(name = "64")]
    Rv64,
}

impl Xlen {
    pub fn bits(self) -> u32 {
        match self {
            Xlen::Rv32 => 32,
            Xlen::Rv64 => 64,
        }
    }
}

/// Everything one run needs to know.
#[derive(Debug, Clone)]
pub struct Config {
    pub input: PathBuf,
    pub xlen: Xlen,
    /// Overrides the `riscv{xlen}-unknown-elf-` tool prefix.
    pub prefix: Option<String>,
    /// Holds `common/crt0.S` and `common/link.ld`.
    pub build_root: PathBuf,
    /// Objects, executables, disassembly and section dumps.
    pub out_dir: PathBuf,
    pub stim_dir: PathBuf,
    pub clean: bool,
    pub verbose: bool,
    pub dump: bool,
    pub demangle: bool,
}

impl Config {
    pub fn new(input: impl Into<PathBuf>) -> Self {
        let build_root = PathBuf::from(".");
        Self {
            input: input.into(),
            xlen: Xlen::default(),
            prefix: None,
            out_dir: build_root.join("build"),
            build_root,
            stim_dir: PathBuf::from("stims"),
            clean: false,
            verbose: false,
            dump: false,
            demangle: false,
        }
    }

    pub fn target_triple(&self) -> String {
        format!("riscv{}-unknown-elf", self.xlen.bits())
    }

    pub fn toolchain_prefix(&self) -> String {
        self.prefix
            .clone()
            .unwrap_or_else(|| format!("{}-", self.target_triple()))
    }

    pub fn crt0(&self) -> PathBuf {
        self.build_root.join("common").join("crt0.S")
    }

    pub fn link_script(&self) -> PathBuf {
        self.build_root.join("common").join("link.ld")
    }
}
