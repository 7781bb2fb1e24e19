//! Hand-assembled little-endian ELF32 images for tests.

#![allow(dead_code)]

use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};

use stimgen::toolchain::Toolchain;
use stimgen::{Error, Result, Stage};

const SHT_PROGBITS: u32 = 1;
const SHT_SYMTAB: u32 = 2;
const SHT_STRTAB: u32 = 3;
const SHT_NOBITS: u32 = 8;
const SHF_WRITE: u32 = 0x1;
const SHF_ALLOC: u32 = 0x2;
const SHF_EXECINSTR: u32 = 0x4;

const EHDR_SIZE: usize = 52;
const SHDR_SIZE: usize = 40;
const SYM_SIZE: usize = 16;

struct RawSection {
    name: String,
    sh_type: u32,
    flags: u32,
    addr: u32,
    data: Vec<u8>,
    size: u32,
    link: u32,
    entsize: u32,
}

#[derive(Default)]
pub struct ElfBuilder {
    sections: Vec<RawSection>,
    symbols: Vec<(String, u32, u32)>,
}

impl ElfBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(self, addr: u32, data: &[u8]) -> Self {
        self.progbits(".text", SHF_ALLOC | SHF_EXECINSTR, addr, data)
    }

    pub fn data(self, name: &str, addr: u32, data: &[u8]) -> Self {
        self.progbits(name, SHF_ALLOC | SHF_WRITE, addr, data)
    }

    pub fn bss(mut self, name: &str, addr: u32, size: u32) -> Self {
        self.sections.push(RawSection {
            name: name.into(),
            sh_type: SHT_NOBITS,
            flags: SHF_ALLOC | SHF_WRITE,
            addr,
            data: Vec::new(),
            size,
            link: 0,
            entsize: 0,
        });
        self
    }

    pub fn function(mut self, name: &str, addr: u32, size: u32) -> Self {
        self.symbols.push((name.into(), addr, size));
        self
    }

    fn progbits(mut self, name: &str, flags: u32, addr: u32, data: &[u8]) -> Self {
        self.sections.push(RawSection {
            name: name.into(),
            sh_type: SHT_PROGBITS,
            flags,
            addr,
            data: data.to_vec(),
            size: data.len() as u32,
            link: 0,
            entsize: 0,
        });
        self
    }

    pub fn build(mut self) -> Vec<u8> {
        if !self.symbols.is_empty() {
            let strtab_index = self.sections.len() as u32 + 2;
            let mut strtab = vec![0u8];
            let mut symtab = vec![0u8; SYM_SIZE];
            for (name, addr, size) in &self.symbols {
                let name_off = strtab.len() as u32;
                strtab.extend_from_slice(name.as_bytes());
                strtab.push(0);
                symtab.extend_from_slice(&name_off.to_le_bytes());
                symtab.extend_from_slice(&addr.to_le_bytes());
                symtab.extend_from_slice(&size.to_le_bytes());
                symtab.push(0x12); // STB_GLOBAL, STT_FUNC
                symtab.push(0);
                symtab.extend_from_slice(&1u16.to_le_bytes());
            }
            let symtab_size = symtab.len() as u32;
            let strtab_size = strtab.len() as u32;
            self.sections.push(RawSection {
                name: ".symtab".into(),
                sh_type: SHT_SYMTAB,
                flags: 0,
                addr: 0,
                data: symtab,
                size: symtab_size,
                link: strtab_index,
                entsize: SYM_SIZE as u32,
            });
            self.sections.push(RawSection {
                name: ".strtab".into(),
                sh_type: SHT_STRTAB,
                flags: 0,
                addr: 0,
                data: strtab,
                size: strtab_size,
                link: 0,
                entsize: 0,
            });
        }

        let mut shstrtab = vec![0u8];
        let mut name_offsets = Vec::new();
        for section in &self.sections {
            name_offsets.push(shstrtab.len() as u32);
            shstrtab.extend_from_slice(section.name.as_bytes());
            shstrtab.push(0);
        }
        let shstrtab_name = shstrtab.len() as u32;
        shstrtab.extend_from_slice(b".shstrtab\0");

        let mut out = vec![0u8; EHDR_SIZE];
        let mut offsets = Vec::new();
        for section in &self.sections {
            align4(&mut out);
            offsets.push(out.len() as u32);
            out.extend_from_slice(&section.data);
        }
        let shstrtab_offset = out.len() as u32;
        out.extend_from_slice(&shstrtab);
        align4(&mut out);

        let shoff = out.len() as u32;
        let shnum = self.sections.len() as u16 + 2;
        out.extend_from_slice(&[0u8; SHDR_SIZE]);
        for ((section, name), offset) in self.sections.iter().zip(&name_offsets).zip(&offsets) {
            push_shdr(
                &mut out,
                [
                    *name,
                    section.sh_type,
                    section.flags,
                    section.addr,
                    *offset,
                    section.size,
                    section.link,
                    0,
                    4,
                    section.entsize,
                ],
            );
        }
        push_shdr(
            &mut out,
            [
                shstrtab_name,
                SHT_STRTAB,
                0,
                0,
                shstrtab_offset,
                shstrtab.len() as u32,
                0,
                0,
                1,
                0,
            ],
        );

        let mut header = Vec::with_capacity(EHDR_SIZE);
        header.extend_from_slice(&[0x7f, b'E', b'L', b'F', 1, 1, 1, 0]);
        header.extend_from_slice(&[0u8; 8]);
        header.extend_from_slice(&2u16.to_le_bytes()); // ET_EXEC
        header.extend_from_slice(&243u16.to_le_bytes()); // EM_RISCV
        header.extend_from_slice(&1u32.to_le_bytes());
        header.extend_from_slice(&self.sections.first().map_or(0, |s| s.addr).to_le_bytes());
        header.extend_from_slice(&0u32.to_le_bytes()); // e_phoff
        header.extend_from_slice(&shoff.to_le_bytes());
        header.extend_from_slice(&0u32.to_le_bytes()); // e_flags
        header.extend_from_slice(&(EHDR_SIZE as u16).to_le_bytes());
        header.extend_from_slice(&32u16.to_le_bytes());
        header.extend_from_slice(&0u16.to_le_bytes()); // e_phnum
        header.extend_from_slice(&(SHDR_SIZE as u16).to_le_bytes());
        header.extend_from_slice(&shnum.to_le_bytes());
        header.extend_from_slice(&(shnum - 1).to_le_bytes());
        out[..EHDR_SIZE].copy_from_slice(&header);
        out
    }

    pub fn write(self, path: &Path) {
        fs::write(path, self.build()).unwrap();
    }
}

fn align4(out: &mut Vec<u8>) {
    while out.len() % 4 != 0 {
        out.push(0);
    }
}

fn push_shdr(out: &mut Vec<u8>, fields: [u32; 10]) {
    for field in fields {
        out.extend_from_slice(&field.to_le_bytes());
    }
}

/// Stands in for the cross compiler: "compiling" copies a prebuilt image.
pub struct FakeToolchain {
    pub out_dir: PathBuf,
    pub image: Vec<u8>,
    pub fail: Option<Stage>,
    pub calls: RefCell<Vec<String>>,
}

impl FakeToolchain {
    pub fn new(out_dir: &Path, image: Vec<u8>) -> Self {
        Self {
            out_dir: out_dir.to_path_buf(),
            image,
            fail: None,
            calls: RefCell::new(Vec::new()),
        }
    }

    fn check(&self, stage: Stage, target: &Path) -> Result<()> {
        self.calls.borrow_mut().push(stage.to_string());
        if self.fail == Some(stage) {
            let sh = xshell::Shell::new().unwrap();
            let source = xshell::cmd!(sh, "false").quiet().run().unwrap_err();
            return Err(Error::Toolchain {
                stage,
                target: target.to_path_buf(),
                source,
            });
        }
        Ok(())
    }
}

impl Toolchain for FakeToolchain {
    fn compile(&self, source: &Path) -> Result<PathBuf> {
        self.check(Stage::Compile, source)?;
        let stem = source.file_stem().unwrap().to_string_lossy();
        let elf = self.out_dir.join(format!("{stem}.elf"));
        fs::write(&elf, &self.image).unwrap();
        Ok(elf)
    }

    fn disassemble(&self, elf: &Path) -> Result<PathBuf> {
        self.check(Stage::Disassemble, elf)?;
        let dump = elf.with_extension("dump");
        fs::write(&dump, "").unwrap();
        Ok(dump)
    }
}
