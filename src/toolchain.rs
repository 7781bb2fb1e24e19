//! Driving the RISC-V GNU cross toolchain.

use std::path::{Path, PathBuf};

use log::{debug, info};
use xshell::{cmd, Cmd, Shell};

use crate::config::Config;
use crate::error::{Error, Result, Stage};

const ARCH_FLAGS: &[&str] = &["-march=rv32emc_zicsr", "-mabi=ilp32e"];
const CFLAGS: &[&str] = &["-O0", "-ffunction-sections", "-fdata-sections", "-g"];

/// The external build steps the pipeline needs.
pub trait Toolchain {
    /// Compiles and links `source`, returning the path of the executable.
    fn compile(&self, source: &Path) -> Result<PathBuf>;

    /// Writes a human-readable disassembly of `elf`, returning its path.
    fn disassemble(&self, elf: &Path) -> Result<PathBuf>;
}

#[derive(Debug)]
pub struct GccToolchain {
    prefix: String,
    out_dir: PathBuf,
    crt0: PathBuf,
    link_script: PathBuf,
    verbose: bool,
}

impl GccToolchain {
    pub fn new(config: &Config) -> Self {
        Self {
            prefix: config.toolchain_prefix(),
            out_dir: config.out_dir.clone(),
            crt0: config.crt0(),
            link_script: config.link_script(),
            verbose: config.verbose,
        }
    }

    fn tool(&self, name: &str) -> String {
        format!("{}{}", self.prefix, name)
    }

    fn object_for(&self, source: &Path) -> PathBuf {
        self.out_dir.join(format!("{}.o", stem(source)))
    }

    fn exec(&self, cmd: Cmd<'_>, stage: Stage, target: &Path) -> Result<()> {
        let cmd = if self.verbose { cmd } else { cmd.quiet() };
        debug!("{cmd}");
        cmd.run().map_err(|source| Error::Toolchain {
            stage,
            target: target.to_path_buf(),
            source,
        })
    }

    fn shell(&self, stage: Stage, target: &Path) -> Result<Shell> {
        Shell::new().map_err(|source| Error::Toolchain {
            stage,
            target: target.to_path_buf(),
            source,
        })
    }
}

impl Toolchain for GccToolchain {
    fn compile(&self, source: &Path) -> Result<PathBuf> {
        let sh = self.shell(Stage::Compile, source)?;
        let cc = self.tool("gcc");

        let object = self.object_for(source);
        self.exec(
            cmd!(sh, "{cc} {ARCH_FLAGS...} {CFLAGS...} -c -g {source} -o {object}"),
            Stage::Compile,
            source,
        )?;

        let crt0 = &self.crt0;
        let crt0_object = self.object_for(crt0);
        self.exec(
            cmd!(sh, "{cc} {ARCH_FLAGS...} {CFLAGS...} -c -g {crt0} -o {crt0_object} -DLANGUAGE_ASSEMBLY"),
            Stage::Assemble,
            crt0,
        )?;

        let elf = self.out_dir.join(format!("{}.elf", stem(source)));
        let link_flag = format!("-T{}", self.link_script.display());
        self.exec(
            cmd!(sh, "{cc} {ARCH_FLAGS...} {link_flag} -nostartfiles -o {elf} {object} {crt0_object}"),
            Stage::Link,
            &elf,
        )?;

        info!("ELF generated in {}", elf.display());
        Ok(elf)
    }

    fn disassemble(&self, elf: &Path) -> Result<PathBuf> {
        let sh = self.shell(Stage::Disassemble, elf)?;
        let objdump = self.tool("objdump");
        let cmd = cmd!(sh, "{objdump} {elf} -Ssd");
        let cmd = if self.verbose { cmd } else { cmd.quiet() };
        let listing = cmd.read().map_err(|source| Error::Toolchain {
            stage: Stage::Disassemble,
            target: elf.to_path_buf(),
            source,
        })?;

        let dump = self.out_dir.join(format!("{}.dump", stem(elf)));
        std::fs::write(&dump, listing).map_err(|e| Error::io("write", &dump, e))?;
        debug!("disassembly written to {}", dump.display());
        Ok(dump)
    }
}

/// File name without directory or extension.
pub(crate) fn stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}
