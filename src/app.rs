use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::{debug, info};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::hexprinter::HexPrinter;
use crate::section::{ElfImage, SectionSource};
use crate::stim::{Region, StimGenerator};
use crate::toolchain::{stem, GccToolchain, Toolchain};

/// How the input path is turned into an executable image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    CSource,
    Elf,
}

impl InputKind {
    pub fn classify(path: &Path) -> Result<Self> {
        match path.extension().and_then(|e| e.to_str()) {
            Some("c") => Ok(InputKind::CSource),
            Some("elf") | None => Ok(InputKind::Elf),
            Some(_) => Err(Error::UnknownInput(path.to_path_buf())),
        }
    }
}

/// Where a run left its stim files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outputs {
    pub elf: PathBuf,
    pub imem: PathBuf,
    pub dmem: PathBuf,
}

pub fn run(config: &Config) -> Result<Outputs> {
    run_with(config, &GccToolchain::new(config))
}

/// `run` with the toolchain swapped out.
pub fn run_with<T: Toolchain + ?Sized>(config: &Config, toolchain: &T) -> Result<Outputs> {
    let kind = InputKind::classify(&config.input)?;

    if config.clean {
        match fs::remove_dir_all(&config.out_dir) {
            Ok(()) => debug!("removed {}", config.out_dir.display()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(Error::io("remove", &config.out_dir, e)),
        }
    }
    for dir in [&config.out_dir, &config.stim_dir] {
        fs::create_dir_all(dir).map_err(|e| Error::io("create", dir, e))?;
    }

    let elf = match kind {
        InputKind::CSource => toolchain.compile(&config.input)?,
        InputKind::Elf => config.input.clone(),
    };
    toolchain.disassemble(&elf)?;

    let image = ElfImage::open(&elf)?;
    let name = stem(&config.input);
    let generator = StimGenerator::new(&image).with_artifacts(&config.out_dir, &name);

    let imem = config.stim_dir.join(format!("{name}_imem.hex"));
    let dmem = config.stim_dir.join(format!("{name}_dmem.hex"));
    let imem_lines = generator.write_region(&Region::IMEM, &imem)?;
    let dmem_lines = generator.write_region(&Region::DMEM, &dmem)?;
    debug!("imem: {imem_lines} lines, dmem: {dmem_lines} lines");

    if config.dump {
        dump_regions(&image, config.demangle, io::stdout().lock())?;
    }

    info!(
        "Test compilation complete, output hex in {}, {}",
        imem.display(),
        dmem.display()
    );
    Ok(Outputs { elf, imem, dmem })
}

/// Annotated dump of every section either memory is built from.
pub fn dump_regions<S, W>(source: &S, demangle: bool, out: W) -> Result<()>
where
    S: SectionSource + ?Sized,
    W: io::Write,
{
    let symbols = source.symbols()?;
    let mut printer = HexPrinter::new(out, demangle);
    let names = Region::IMEM.sections.iter().chain(Region::DMEM.sections);
    for (i, name) in names.enumerate() {
        if let Some(section) = source.extract_section(name)? {
            printer
                .print_section(i, &section, &symbols)
                .map_err(|source| Error::Dump {
                    what: format!("annotated dump of section {name}"),
                    source,
                })?;
        }
    }
    Ok(())
}
