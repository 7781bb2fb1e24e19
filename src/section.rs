//! Locating named sections inside an executable image.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use elf::abi;
use elf::endian::AnyEndian;
use elf::ElfBytes;
use log::debug;

use crate::error::{Error, Result};

/// A named byte range of an image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section<'a> {
    pub name: String,
    /// Load address of the first byte.
    pub addr: u64,
    pub body: &'a [u8],
}

/// A sized symbol, used to annotate dumps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Symbol {
    pub addr: u64,
    pub size: u64,
    pub name: String,
}

/// Anything sections can be pulled out of by name.
pub trait SectionSource {
    /// Returns `Ok(None)` when the image simply has no such section.
    fn extract_section(&self, name: &str) -> Result<Option<Section<'_>>>;

    /// Symbols sorted by address. Sources without a symbol table return none.
    fn symbols(&self) -> Result<Vec<Symbol>> {
        Ok(Vec::new())
    }
}

/// An ELF file held in memory.
#[derive(Debug)]
pub struct ElfImage {
    path: PathBuf,
    data: Vec<u8>,
}

impl ElfImage {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let data = fs::read(path).map_err(|e| Error::io("read", path, e))?;
        Self::from_bytes(path, data)
    }

    /// Validates `data` up front so that later lookups only fail on truly
    /// broken section contents.
    pub fn from_bytes(path: impl Into<PathBuf>, data: Vec<u8>) -> Result<Self> {
        let image = Self {
            path: path.into(),
            data,
        };
        let elf = image.parse()?;
        let (shdrs, strtab) = elf
            .section_headers_with_strtab()
            .map_err(|e| Error::malformed(&image.path, e))?;
        match (shdrs, strtab) {
            (Some(shdrs), Some(_)) => {
                debug!("{}: {} section headers", image.path.display(), shdrs.len());
            }
            _ => return Err(Error::malformed(&image.path, "no section header table")),
        }
        Ok(image)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn parse(&self) -> Result<ElfBytes<'_, AnyEndian>> {
        ElfBytes::<AnyEndian>::minimal_parse(&self.data).map_err(|e| Error::malformed(&self.path, e))
    }
}

impl SectionSource for ElfImage {
    fn extract_section(&self, name: &str) -> Result<Option<Section<'_>>> {
        let elf = self.parse()?;
        let shdr = match elf
            .section_header_by_name(name)
            .map_err(|e| Error::malformed(&self.path, e))?
        {
            Some(shdr) => shdr,
            None => return Ok(None),
        };

        if shdr.sh_flags & abi::SHF_COMPRESSED as u64 != 0 {
            return Err(Error::malformed(
                &self.path,
                format!("section {name} is compressed"),
            ));
        }

        let body: &[u8] = if shdr.sh_type == abi::SHT_NOBITS {
            &[]
        } else {
            elf.section_data(&shdr)
                .map_err(|e| Error::malformed(&self.path, e))?
                .0
        };
        debug!(
            "section {name}: addr {:#010x}, {} bytes",
            shdr.sh_addr,
            body.len()
        );

        Ok(Some(Section {
            name: name.to_string(),
            addr: shdr.sh_addr,
            body,
        }))
    }

    fn symbols(&self) -> Result<Vec<Symbol>> {
        let elf = self.parse()?;
        let (symtab, strtab) = match elf
            .symbol_table()
            .map_err(|e| Error::malformed(&self.path, e))?
        {
            Some(tables) => tables,
            None => return Ok(Vec::new()),
        };

        let mut symbols = symtab
            .iter()
            .filter(|s| s.st_size != 0)
            .filter(|s| matches!(s.st_symtype(), abi::STT_FUNC | abi::STT_OBJECT))
            .map(|s| {
                let name = strtab
                    .get(s.st_name as usize)
                    .map_err(|e| Error::malformed(&self.path, e))?;
                Ok::<_, Error>(Symbol {
                    addr: s.st_value,
                    size: s.st_size,
                    name: name.to_string(),
                })
            })
            .collect::<Result<Vec<_>>>()?;
        symbols.sort_by_key(|s| (s.addr, s.size));
        Ok(symbols)
    }
}

/// In-memory sections, for callers that already hold the raw bytes.
#[derive(Debug, Default, Clone)]
pub struct SectionMap {
    sections: BTreeMap<String, (u64, Vec<u8>)>,
    symbols: Vec<Symbol>,
}

impl SectionMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_section(mut self, name: &str, addr: u64, body: impl Into<Vec<u8>>) -> Self {
        self.sections.insert(name.to_string(), (addr, body.into()));
        self
    }

    pub fn with_symbol(mut self, addr: u64, size: u64, name: &str) -> Self {
        self.symbols.push(Symbol {
            addr,
            size,
            name: name.to_string(),
        });
        self.symbols.sort_by_key(|s| (s.addr, s.size));
        self
    }
}

impl SectionSource for SectionMap {
    fn extract_section(&self, name: &str) -> Result<Option<Section<'_>>> {
        Ok(self.sections.get(name).map(|(addr, body)| Section {
            name: name.to_string(),
            addr: *addr,
            body,
        }))
    }

    fn symbols(&self) -> Result<Vec<Symbol>> {
        Ok(self.symbols.clone())
    }
}
