// SPDX-License-Identifier: Apache-2.0

//! On-disk database of optimal sub-circuit implementations.
//!
//! The file is a whitespace-delimited text stream of concatenated records.
//! Each record describes one sub-circuit: the input count `k` (gates
//! `0..k-1` are the inputs), the output count `m`, `m` output truth tables
//! as decimal integers (low bit = all-false assignment), `m` output gate
//! ids, then the internal gates from index `k` upward as a gate-type token
//! plus one operand (`NOT`) or two (everything else). Record boundaries
//! are implicit: the highest gate id mentioned so far tells the reader
//! where the gate list ends, and the next token starts the next record.

use std::collections::HashMap;
use std::fmt;
use std::fmt::Write as _;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::gate::{GateId, GateType};

/// Gate basis a database (or circuit) is expressed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Basis {
    Aig,
    Bench,
}

impl Basis {
    pub fn name(self) -> &'static str {
        match self {
            Basis::Aig => "AIG",
            Basis::Bench => "BENCH",
        }
    }
}

impl fmt::Display for Basis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Error for a basis tag outside `[AIG, BENCH]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseBasisError {
    got: String,
}

impl fmt::Display for ParseBasisError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "incorrect basis '{}'; choose one of [AIG, BENCH]", self.got)
    }
}

impl std::error::Error for ParseBasisError {}

impl FromStr for Basis {
    type Err = ParseBasisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "AIG" => Ok(Basis::Aig),
            "BENCH" => Ok(Basis::Bench),
            _ => Err(ParseBasisError { got: s.to_string() }),
        }
    }
}

#[derive(Debug)]
pub enum DbError {
    /// No database file at the given path.
    MissingFile { path: PathBuf },
    Io(io::Error),
    /// Token-level corruption inside a record.
    Malformed {
        token: String,
        expected: &'static str,
    },
    /// Registry access for a basis that was never loaded.
    NotLoaded { basis: Basis },
}

impl fmt::Display for DbError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingFile { path } => {
                write!(f, "there is no sub-circuit database at {}", path.display())
            }
            Self::Io(e) => write!(f, "database read failed: {}", e),
            Self::Malformed { token, expected } => {
                write!(f, "malformed database: expected {}, got '{}'", expected, token)
            }
            Self::NotLoaded { basis } => {
                write!(f, "{} database is not available", basis)
            }
        }
    }
}

impl std::error::Error for DbError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for DbError {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}

/// In-memory form of the database: parallel per-record tables.
#[derive(Debug, Clone, Default)]
pub struct PatternDb {
    /// Output-pattern vector, exactly as listed in the file, to record
    /// index. A later record with an identical vector overwrites the
    /// mapping.
    pattern_to_index: HashMap<Vec<u64>, usize>,
    input_counts: Vec<usize>,
    outputs: Vec<Vec<GateId>>,
    gate_types: Vec<Vec<GateType>>,
    gate_operands: Vec<Vec<Vec<GateId>>>,
    /// Per record, the number of gates other than `NOT`; the rewriter's
    /// size tie-breaker.
    operator_counts: Vec<u32>,
}

fn next_token<'a>(
    tokens: &mut impl Iterator<Item = &'a str>,
    expected: &'static str,
) -> Result<&'a str, DbError> {
    tokens.next().ok_or(DbError::Malformed {
        token: "<eof>".to_string(),
        expected,
    })
}

fn next_int<'a, T: FromStr>(
    tokens: &mut impl Iterator<Item = &'a str>,
    expected: &'static str,
) -> Result<T, DbError> {
    let token = next_token(tokens, expected)?;
    token.parse().map_err(|_| DbError::Malformed {
        token: token.to_string(),
        expected,
    })
}

impl PatternDb {
    /// Reads the database file for `basis`.
    ///
    /// The text format is identical for both bases; the tag only says
    /// which gate vocabulary the records draw from.
    pub fn load(path: &Path, basis: Basis) -> Result<Self, DbError> {
        if !path.exists() {
            return Err(DbError::MissingFile {
                path: path.to_path_buf(),
            });
        }
        let text = fs::read_to_string(path)?;
        let db = Self::parse(&text)?;
        log::info!(
            "loaded {} {} sub-circuit patterns from {}",
            db.len(),
            basis,
            path.display()
        );
        Ok(db)
    }

    /// Parses the whitespace-delimited record stream.
    pub fn parse(text: &str) -> Result<Self, DbError> {
        let mut db = PatternDb::default();
        let mut tokens = text.split_whitespace().peekable();

        while tokens.peek().is_some() {
            let inputs_number: usize = next_int(&mut tokens, "input count")?;
            let outputs_number: usize = next_int(&mut tokens, "output count")?;

            let mut patterns: Vec<u64> = Vec::with_capacity(outputs_number);
            for _ in 0..outputs_number {
                patterns.push(next_int(&mut tokens, "output truth table")?);
            }

            let mut outputs: Vec<GateId> = Vec::with_capacity(outputs_number);
            let mut max_index: GateId = 0;
            for _ in 0..outputs_number {
                let output: GateId = next_int(&mut tokens, "output gate id")?;
                max_index = max_index.max(output);
                outputs.push(output);
            }

            let mut gate_types: Vec<GateType> = Vec::new();
            let mut gate_operands: Vec<Vec<GateId>> = Vec::new();
            let mut operator_count: u32 = 0;

            // The database uses only NOT and the binary operators; each
            // operand id read extends the known size of the sub-circuit.
            let mut i = inputs_number;
            while i <= max_index {
                let type_token = next_token(&mut tokens, "gate type")?;
                let ty = GateType::from_token(type_token).ok_or(DbError::Malformed {
                    token: type_token.to_string(),
                    expected: "gate type",
                })?;
                gate_types.push(ty);

                let operand: GateId = next_int(&mut tokens, "operand id")?;
                max_index = max_index.max(operand);
                let mut operands = vec![operand];

                if ty != GateType::Not {
                    let operand: GateId = next_int(&mut tokens, "operand id")?;
                    max_index = max_index.max(operand);
                    operands.push(operand);
                    operator_count += 1;
                }
                gate_operands.push(operands);
                i += 1;
            }

            let index = db.input_counts.len();
            if let Some(previous) = db.pattern_to_index.insert(patterns.clone(), index) {
                log::warn!(
                    "output pattern {:?} of record {} already mapped to record {}; overwriting",
                    patterns,
                    index,
                    previous
                );
            }
            db.input_counts.push(inputs_number);
            db.outputs.push(outputs);
            db.gate_types.push(gate_types);
            db.gate_operands.push(gate_operands);
            db.operator_counts.push(operator_count);
        }

        Ok(db)
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.input_counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.input_counts.is_empty()
    }

    /// Record index for an output-pattern vector, in file order.
    pub fn lookup(&self, pattern: &[u64]) -> Option<usize> {
        self.pattern_to_index.get(pattern).copied()
    }

    pub fn input_count(&self, index: usize) -> usize {
        self.input_counts[index]
    }

    pub fn outputs(&self, index: usize) -> &[GateId] {
        &self.outputs[index]
    }

    pub fn gate_types(&self, index: usize) -> &[GateType] {
        &self.gate_types[index]
    }

    pub fn gate_operands(&self, index: usize) -> &[Vec<GateId>] {
        &self.gate_operands[index]
    }

    pub fn operator_count(&self, index: usize) -> u32 {
        self.operator_counts[index]
    }

    /// Re-serializes one record by the file-format rules. Returns `None`
    /// for an out-of-range index or a record whose pattern was overwritten
    /// by a later duplicate.
    pub fn record_to_text(&self, index: usize) -> Option<String> {
        if index >= self.len() {
            return None;
        }
        let pattern = self
            .pattern_to_index
            .iter()
            .find(|&(_, &i)| i == index)
            .map(|(pattern, _)| pattern)?;

        let mut text = String::new();
        write!(text, "{} {}", self.input_counts[index], self.outputs[index].len()).unwrap();
        for value in pattern {
            write!(text, " {}", value).unwrap();
        }
        for output in &self.outputs[index] {
            write!(text, " {}", output).unwrap();
        }
        for (ty, operands) in self.gate_types[index].iter().zip(&self.gate_operands[index]) {
            write!(text, " {}", ty).unwrap();
            for operand in operands {
                write!(text, " {}", operand).unwrap();
            }
        }
        Some(text)
    }
}
