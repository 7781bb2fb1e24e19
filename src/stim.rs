//! Building imem/dmem stim files from the sections of an image.

use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use log::{debug, warn};
use tempfile::NamedTempFile;

use crate::error::{Error, Result};
use crate::hexdump::HexDump;
use crate::packer::{self, ImageLine};
use crate::section::{Section, SectionSource};

/// A simulated memory and the sections that initialise it, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    pub name: &'static str,
    pub sections: &'static [&'static str],
}

impl Region {
    pub const IMEM: Region = Region {
        name: "imem",
        sections: &[".text"],
    };
    pub const DMEM: Region = Region {
        name: "dmem",
        sections: &[".data", ".sdata"],
    };
}

pub struct StimGenerator<'a, S: ?Sized> {
    source: &'a S,
    artifacts: Option<(PathBuf, String)>,
}

impl<'a, S: SectionSource + ?Sized> StimGenerator<'a, S> {
    pub fn new(source: &'a S) -> Self {
        Self {
            source,
            artifacts: None,
        }
    }

    /// Also keep `<dir>/<stem>.elf<section>` and its `.xxd` text dump for
    /// every section found.
    pub fn with_artifacts(mut self, dir: impl Into<PathBuf>, stem: &str) -> Self {
        self.artifacts = Some((dir.into(), stem.to_string()));
        self
    }

    /// Lines for every section of `region`. A run of consecutive absent
    /// sections is stood in for by a single dummy line, so a region with no
    /// sections at all still yields exactly one line.
    pub fn generate(&self, region: &Region) -> Result<Vec<ImageLine>> {
        let mut lines = Vec::new();
        let mut in_absent_run = false;
        for &name in region.sections {
            match self.source.extract_section(name)? {
                Some(section) => {
                    in_absent_run = false;
                    self.save_artifacts(&section)?;
                    let packed = packer::pack_dump(HexDump::new(section.body)).map_err(|source| {
                        Error::Dump {
                            what: format!("hex dump of section {name}"),
                            source,
                        }
                    })?;
                    debug!(
                        "{}: {name} -> {} bytes, {} lines",
                        region.name,
                        section.body.len(),
                        packed.len()
                    );
                    lines.extend(packed);
                }
                None if in_absent_run => {
                    debug!("{}: section={name} not available either", region.name);
                }
                None => {
                    warn!(
                        "section={name} not available, generating dummy {} line",
                        region.name
                    );
                    lines.push(ImageLine::DUMMY);
                    in_absent_run = true;
                }
            }
        }
        Ok(lines)
    }

    /// Generates `region` and replaces whatever was at `path`.
    pub fn write_region(&self, region: &Region, path: &Path) -> Result<usize> {
        let lines = self.generate(region)?;
        write_stim(path, &lines)?;
        Ok(lines.len())
    }

    fn save_artifacts(&self, section: &Section<'_>) -> Result<()> {
        let (dir, stem) = match &self.artifacts {
            Some(artifacts) => artifacts,
            None => return Ok(()),
        };
        let raw = dir.join(format!("{stem}.elf{}", section.name));
        fs::write(&raw, section.body).map_err(|e| Error::io("write", &raw, e))?;

        let xxd = dir.join(format!("{stem}.elf{}.xxd", section.name));
        let file = fs::File::create(&xxd).map_err(|e| Error::io("create", &xxd, e))?;
        HexDump::new(section.body)
            .write_to(BufWriter::new(file))
            .map_err(|e| Error::io("write", &xxd, e))?;
        debug!("wrote {} and {}", raw.display(), xxd.display());
        Ok(())
    }
}

/// Writes `lines` to a temporary file beside `path`, then renames it into
/// place. A failure part-way leaves the previous file untouched.
pub fn write_stim(path: &Path, lines: &[ImageLine]) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let tmp = NamedTempFile::new_in(dir).map_err(|e| Error::io("create a file in", dir, e))?;
    {
        let mut out = BufWriter::new(tmp.as_file());
        for line in lines {
            writeln!(out, "{line}").map_err(|e| Error::io("write", tmp.path(), e))?;
        }
        out.flush().map_err(|e| Error::io("write", tmp.path(), e))?;
    }
    tmp.persist(path)
        .map_err(|e| Error::io("replace", path, e.error))?;
    Ok(())
}
