// SPDX-License-Identifier: Apache-2.0

//! Two-ancestor coloring.
//!
//! Each binary gate is labeled with the color of its sorted operand pair;
//! gates sharing a pair share a color. The labels seed the three-ancestor
//! pass, which is what the rewriter actually matches on.

use std::collections::HashMap;

use crate::circuit::CircuitView;
use crate::gate::GateId;
use crate::topo;

/// Position of a color within its coloring's `colors` table.
pub type ColorId = usize;

/// Error raised by the coloring passes. The passes never return a partial
/// coloring: any error aborts the whole pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColoringError {
    /// The circuit has a gate with more than two operands.
    TooManyOperands { gate: GateId },
}

impl std::fmt::Display for ColoringError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TooManyOperands { gate } => {
                write!(f, "gate {} has more than two operands", gate)
            }
        }
    }
}

impl std::error::Error for ColoringError {}

/// A pair of ancestor gates together with the gates painted with it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TwoColor {
    /// Parent ids, kept ascending: `first_parent <= second_parent`.
    pub first_parent: GateId,
    pub second_parent: GateId,
    gates: Vec<GateId>,
}

impl TwoColor {
    fn new(parent_one: GateId, parent_two: GateId) -> Self {
        let (first_parent, second_parent) = if parent_one <= parent_two {
            (parent_one, parent_two)
        } else {
            (parent_two, parent_one)
        };
        Self {
            first_parent,
            second_parent,
            gates: Vec::new(),
        }
    }

    pub fn parents(&self) -> (GateId, GateId) {
        (self.first_parent, self.second_parent)
    }

    pub fn has_parent(&self, gate: GateId) -> bool {
        self.first_parent == gate || self.second_parent == gate
    }

    /// Gates painted with this color, in paint order.
    pub fn gates(&self) -> &[GateId] {
        &self.gates
    }
}

/// Result of the two-coloring pass over one circuit.
///
/// Color ids are dense from zero and stable within a pass, but carry no
/// meaning across circuits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TwoColoring {
    /// All colors; a color's id is its index here.
    pub colors: Vec<TwoColor>,
    /// Per gate, its color. Inputs and constants stay uncolored, as do
    /// unary gates whose operand is uncolored.
    pub gate_color: Vec<Option<ColorId>>,
    /// Sorted parent pair to color id.
    pub parents_to_color: HashMap<(GateId, GateId), ColorId>,
}

impl TwoColoring {
    /// Colors every gate of `view`, visiting operands before their users.
    pub fn build(view: &impl CircuitView) -> Result<Self, ColoringError> {
        let mut coloring = TwoColoring {
            colors: Vec::new(),
            gate_color: vec![None; view.gate_count()],
            parents_to_color: HashMap::new(),
        };

        for gate in topo::post_order(view) {
            match view.operands(gate) {
                // Input or constant.
                [] => {}
                // A single-operand gate passes its operand's color through,
                // whatever the unary type.
                &[p] => coloring.gate_color[gate] = coloring.gate_color[p],
                &[a, b] => {
                    let color = coloring.intern(a, b);
                    coloring.paint(gate, color);
                }
                _ => return Err(ColoringError::TooManyOperands { gate }),
            }
        }

        log::debug!(
            "two-coloring: {} colors over {} gates",
            coloring.colors.len(),
            view.gate_count()
        );
        Ok(coloring)
    }

    /// Returns the color of the sorted pair, creating it if new.
    fn intern(&mut self, parent_one: GateId, parent_two: GateId) -> ColorId {
        let key = if parent_one <= parent_two {
            (parent_one, parent_two)
        } else {
            (parent_two, parent_one)
        };
        if let Some(&color) = self.parents_to_color.get(&key) {
            return color;
        }
        let color = self.colors.len();
        self.colors.push(TwoColor::new(key.0, key.1));
        self.parents_to_color.insert(key, color);
        color
    }

    fn paint(&mut self, gate: GateId, color: ColorId) {
        self.colors[color].gates.push(gate);
        self.gate_color[gate] = Some(color);
    }

    pub fn color_count(&self) -> usize {
        self.colors.len()
    }

    pub fn color_of(&self, gate: GateId) -> Option<ColorId> {
        self.gate_color[gate]
    }
}
