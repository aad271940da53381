//! Parser for the netlist text format.
//!
//! A netlist is line-oriented: one component per line, four
//! whitespace-separated fields.
//!
//! # Grammar Overview
//!
//! ```text
//! netlist   = { line }
//! line      = component [comment] | comment | empty
//! comment   = ('#' | ';') { any_char }
//! component = symbol start_node end_node value
//!
//! symbol    = letter { letter | digit }
//! node      = digit+
//! value     = number [unit_suffix]
//! unit_suffix = 'p' | 'n' | 'u' | 'm' | 'k' | 'M' | 'G'
//! ```
//!
//! # Component Symbols
//!
//! | Symbol | Description | Value field |
//! |--------|-------------|-------------|
//! | R | Resistor | resistance (Ω) |
//! | C | Capacitor | capacitance (F) |
//! | L | Inductor | inductance (H) |
//! | Vi | Audio input voltage source | initial voltage (V) |
//! | Vo | Voltage probe (output tap) | ignored |
//! | V | Ideal voltage source | voltage (V) |
//! | I | Current source, flowing start → end | current (A) |
//! | O | Ideal op-amp, inputs start/end | output node index |
//! | D | Diode, anode start, cathode end | ignored |
//!
//! Node `0` is ground. Nodes must be numbered contiguously from 0.
//!
//! # Example
//!
//! ```text
//! # RC low-pass filter
//! Vi 1 0 0
//! R  1 2 10k
//! C  2 0 100n
//! Vo 2 0 0
//! ```

mod ast;
mod parser;

pub use ast::*;
pub use parser::{parse_value, Parser};

use crate::error::Result;

/// Parse netlist text into an AST.
pub fn parse(input: &str) -> Result<NetlistAst> {
    Parser::new(input).parse()
}

/// Parse a netlist file.
pub fn parse_file(path: &std::path::Path) -> Result<NetlistAst> {
    let content = read_file(path)?;
    parse(&content)
}

/// Read a netlist file into memory.
pub fn read_file(path: &std::path::Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|e| crate::error::CircuitError::FileReadError {
        path: path.display().to_string(),
        source: e,
    })
}
