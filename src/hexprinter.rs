use std::io::{self, Write};

use ansi_term::{Color, Style};
use rustc_demangle::demangle;

use crate::hexdump::{self, BYTES_PER_RECORD};
use crate::section::{Section, Symbol};

const BG_COLORS: [u8; 2] = [232, 236];
const FG_COLORS: [u8; 7] = [1, 2, 3, 4, 5, 6, 7];
const NO_SYMBOL_FG: u8 = 8;

/// Colour hex dump of sections, with bytes tinted by the symbol they belong to.
pub struct HexPrinter<W> {
    printer: ColorPrinter<W>,
    demangle: bool,
}

impl<W: Write> HexPrinter<W> {
    pub fn new(out: W, demangle: bool) -> Self {
        Self {
            printer: ColorPrinter::new(out),
            demangle,
        }
    }

    pub fn into_inner(self) -> W {
        self.printer.out
    }

    /// `index` picks the background so neighbouring sections alternate.
    pub fn print_section(
        &mut self,
        index: usize,
        section: &Section<'_>,
        symbols: &[Symbol],
    ) -> io::Result<()> {
        let bg = BG_COLORS[index % BG_COLORS.len()];
        self.printer.print(
            &format!("[{}] {} bytes", section.name, section.body.len()),
            Style::default().on(Color::Fixed(bg)),
        )?;
        self.printer.newline()?;

        for record in hexdump::records(section.body) {
            let line_addr = section.addr.saturating_add(record.offset);
            self.printer
                .print(&format!("{:#010x} | ", line_addr), Style::default())?;

            for i in 0..BYTES_PER_RECORD {
                match record.bytes.get(i) {
                    Some(byte) => {
                        let fg = fg_at(symbols, line_addr.saturating_add(i as u64));
                        self.printer.print(
                            &format!("{:02x} ", byte),
                            Style::default().fg(Color::Fixed(fg)).on(Color::Fixed(bg)),
                        )?;
                    }
                    None => self.printer.print("   ", Style::default())?,
                }
                if (i + 1) % 8 == 0 {
                    self.printer.print(" ", Style::default())?;
                }
            }

            self.printer.print("| ", Style::default())?;
            for (i, &byte) in record.bytes.iter().enumerate() {
                let fg = fg_at(symbols, line_addr.saturating_add(i as u64));
                let style = Style::default()
                    .bold()
                    .fg(Color::Fixed(fg))
                    .on(Color::Fixed(bg));
                if byte.is_ascii_graphic() {
                    self.printer.print(&format!("{}", byte as char), style)?;
                } else {
                    self.printer.print(".", style)?;
                }
            }
            for _ in record.bytes.len()..BYTES_PER_RECORD {
                self.printer.print(" ", Style::default())?;
            }

            let line_end = line_addr.saturating_add(record.bytes.len() as u64);
            let starting = symbols
                .iter()
                .enumerate()
                .filter(|(_, s)| s.addr >= line_addr && s.addr < line_end);
            let mut first = true;
            for (i, sym) in starting {
                if first {
                    self.printer.print(" | ", Style::default())?;
                    first = false;
                }
                let label = self.label(&sym.name);
                self.printer.print(
                    &format!("{:#010x}+{:#x}: {} ", sym.addr, sym.size, label),
                    Style::default().fg(Color::Fixed(FG_COLORS[i % FG_COLORS.len()])),
                )?;
            }
            self.printer.newline()?;
        }
        self.printer.flush()
    }

    fn label(&self, name: &str) -> String {
        if self.demangle {
            format!("{:#}", demangle(name))
        } else {
            name.to_string()
        }
    }
}

/// Innermost symbol covering `addr` decides the colour.
fn fg_at(symbols: &[Symbol], addr: u64) -> u8 {
    symbols
        .iter()
        .rposition(|s| s.addr <= addr && addr < s.addr.saturating_add(s.size))
        .map(|i| FG_COLORS[i % FG_COLORS.len()])
        .unwrap_or(NO_SYMBOL_FG)
}

/// Emits only the escape codes needed to move between styles.
#[derive(Debug)]
struct ColorPrinter<W> {
    out: W,
    last_style: Style,
}

impl<W: Write> ColorPrinter<W> {
    fn new(out: W) -> Self {
        Self {
            out,
            last_style: Style::default(),
        }
    }

    fn print(&mut self, s: &str, style: Style) -> io::Result<()> {
        if self.last_style != style {
            write!(self.out, "{}", self.last_style.infix(style))?;
            self.last_style = style;
        }
        write!(self.out, "{}", s)
    }

    fn newline(&mut self) -> io::Result<()> {
        self.print("\n", Style::default())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.out.flush()
    }
}
