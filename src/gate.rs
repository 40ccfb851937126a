// SPDX-License-Identifier: Apache-2.0

//! Gate-type vocabulary shared by circuit views and the pattern database.

use std::fmt;

/// Index of a gate within a circuit's gate array.
pub type GateId = usize;

/// The closed set of gate kinds a circuit may contain.
///
/// `Mux` is ternary and never appears in database patterns; the database
/// restricts itself to the binary operators plus `Not`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GateType {
    Input,
    Not,
    And,
    Nand,
    Or,
    Nor,
    Xor,
    Xnor,
    Iff,
    Buff,
    Mux,
    ConstFalse,
    ConstTrue,
}

impl GateType {
    /// Parses an uppercase ASCII gate-type token, e.g. `"NAND"`.
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "INPUT" => Some(GateType::Input),
            "NOT" => Some(GateType::Not),
            "AND" => Some(GateType::And),
            "NAND" => Some(GateType::Nand),
            "OR" => Some(GateType::Or),
            "NOR" => Some(GateType::Nor),
            "XOR" => Some(GateType::Xor),
            "XNOR" => Some(GateType::Xnor),
            "IFF" => Some(GateType::Iff),
            "BUFF" => Some(GateType::Buff),
            "MUX" => Some(GateType::Mux),
            "CONST_FALSE" => Some(GateType::ConstFalse),
            "CONST_TRUE" => Some(GateType::ConstTrue),
            _ => None,
        }
    }

    /// The token form used in circuit files and the pattern database.
    pub fn token(self) -> &'static str {
        match self {
            GateType::Input => "INPUT",
            GateType::Not => "NOT",
            GateType::And => "AND",
            GateType::Nand => "NAND",
            GateType::Or => "OR",
            GateType::Nor => "NOR",
            GateType::Xor => "XOR",
            GateType::Xnor => "XNOR",
            GateType::Iff => "IFF",
            GateType::Buff => "BUFF",
            GateType::Mux => "MUX",
            GateType::ConstFalse => "CONST_FALSE",
            GateType::ConstTrue => "CONST_TRUE",
        }
    }

    /// Number of operands a gate of this type takes.
    pub fn arity(self) -> usize {
        match self {
            GateType::Input | GateType::ConstFalse | GateType::ConstTrue => 0,
            GateType::Not | GateType::Buff | GateType::Iff => 1,
            GateType::Mux => 3,
            _ => 2,
        }
    }

    pub fn is_unary(self) -> bool {
        self.arity() == 1
    }
}

impl fmt::Display for GateType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}
