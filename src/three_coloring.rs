// SPDX-License-Identifier: Apache-2.0

//! Three-ancestor coloring.
//!
//! Builds on the two-ancestor pass: a gate whose two color parents are
//! themselves colored roots a sub-circuit over at most three ancestors.
//! Each gate carries up to two such colors; the rewriter matches the
//! painted gate sets against the pattern database.
//!
//! The branch ladder below is ordering-sensitive: candidate lists are
//! scanned in insertion order with the first child's list as the outer
//! loop, and the first matching branch wins. Changing either produces a
//! different (still valid) coloring, so the order is part of the contract.

use std::collections::HashMap;

use crate::circuit::CircuitView;
use crate::gate::{GateId, GateType};
use crate::topo;
use crate::two_coloring::{ColorId, ColoringError, TwoColoring};

/// A triple of ancestor gates together with the gates painted with it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThreeColor {
    /// Parent ids, kept ascending.
    pub first_parent: GateId,
    pub second_parent: GateId,
    pub third_parent: GateId,
    gates: Vec<GateId>,
}

impl ThreeColor {
    fn new(parents: [GateId; 3]) -> Self {
        Self {
            first_parent: parents[0],
            second_parent: parents[1],
            third_parent: parents[2],
            gates: Vec::new(),
        }
    }

    pub fn parents(&self) -> [GateId; 3] {
        [self.first_parent, self.second_parent, self.third_parent]
    }

    pub fn has_parent(&self, gate: GateId) -> bool {
        self.first_parent == gate || self.second_parent == gate || self.third_parent == gate
    }

    /// Gates painted with this color, in paint order.
    pub fn gates(&self) -> &[GateId] {
        &self.gates
    }
}

fn sorted_triple(a: GateId, b: GateId, c: GateId) -> [GateId; 3] {
    let mut parents = [a, b, c];
    parents.sort_unstable();
    parents
}

/// Result of the three-coloring pass over one circuit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThreeColoring {
    /// All colors; a color's id is its index here.
    pub colors: Vec<ThreeColor>,
    /// Per gate, up to two color ids in paint order.
    pub gate_colors: Vec<Vec<ColorId>>,
    /// Sorted parent triple to color id.
    pub parents_to_color: HashMap<[GateId; 3], ColorId>,
    /// Per gate, the gate that directly negates it, if any.
    pub negation_users: Vec<Option<GateId>>,
    /// The pair coloring this pass was composed from; the rewriter consults
    /// both.
    pub two_coloring: TwoColoring,
}

impl ThreeColoring {
    /// Colors every gate of `view`, visiting operands before their users.
    pub fn build(view: &impl CircuitView) -> Result<Self, ColoringError> {
        let two_coloring = TwoColoring::build(view)?;
        let mut coloring = ThreeColoring {
            colors: Vec::new(),
            gate_colors: vec![Vec::new(); view.gate_count()],
            parents_to_color: HashMap::new(),
            negation_users: vec![None; view.gate_count()],
            two_coloring,
        };

        for gate in topo::post_order(view) {
            let operands = view.operands(gate);

            // Input or constant.
            if operands.is_empty() {
                continue;
            }
            // A single-operand gate passes its operand's colors through,
            // whatever the unary type.
            if let &[p] = operands {
                for color in coloring.gate_colors[p].clone() {
                    coloring.paint(gate, color);
                }
                if view.gate_type(gate) == GateType::Not {
                    coloring.negation_users[p] = Some(gate);
                }
                continue;
            }
            if operands.len() > 2 {
                return Err(ColoringError::TooManyOperands { gate });
            }

            // Without a two-color there is no sub-circuit root here.
            let Some(two_color) = coloring.two_coloring.gate_color[gate] else {
                continue;
            };
            let (child_1, child_2) = coloring.two_coloring.colors[two_color].parents();

            // Uncolored children on both sides means every ancestor within
            // reach is an input; nothing to compose.
            if coloring.two_coloring.gate_color[child_1].is_none()
                && coloring.two_coloring.gate_color[child_2].is_none()
            {
                continue;
            }

            coloring.color_binary_gate(gate, child_1, child_2);
        }

        let painted = coloring.gate_colors.iter().filter(|c| !c.is_empty()).count();
        log::debug!(
            "three-coloring: {} colors, {} painted gates over {} gates",
            coloring.colors.len(),
            painted,
            view.gate_count()
        );
        Ok(coloring)
    }

    /// The case ladder for a binary gate whose two-color parents are
    /// `child_1 <= child_2`, at least one of them colored.
    fn color_binary_gate(&mut self, gate: GateId, child_1: GateId, child_2: GateId) {
        // Candidate scan. `common` collects colors present on both
        // children; the 1-3 / 3-1 shapes keep the last match of the scan.
        let mut common_colors: Vec<ColorId> = Vec::new();
        let mut color_type_13: Option<ColorId> = None;
        let mut color_type_31: Option<ColorId> = None;

        for &first_child_color in &self.gate_colors[child_1] {
            for &second_child_color in &self.gate_colors[child_2] {
                if first_child_color == second_child_color {
                    common_colors.push(first_child_color);
                } else if self.colors[second_child_color].has_parent(child_1) {
                    color_type_13 = Some(second_child_color);
                }
            }
            if self.colors[first_child_color].has_parent(child_2) {
                color_type_31 = Some(first_child_color);
            }
        }

        // Both of the children's colors already cover this gate.
        if common_colors.len() == 2 {
            self.paint(gate, common_colors[0]);
            self.paint(gate, common_colors[1]);
            return;
        }

        if common_colors.len() == 1 {
            self.paint(gate, common_colors[0]);
            if let Some(color) = color_type_13 {
                self.paint(gate, color);
            } else if let Some(color) = color_type_31 {
                self.paint(gate, color);
            }
            return;
        }

        // A color on child_2 reaches through child_1; pair it with the
        // triple spanned by child_1's own parents and child_2.
        if let Some(color) = color_type_13 {
            self.paint(gate, color);
            if let Some(first_child_two_color) = self.two_coloring.gate_color[child_1] {
                let (parent_1, parent_2) = self.two_coloring.colors[first_child_two_color].parents();
                match self.find_color_with_parents(child_2, parent_1, parent_2) {
                    Some(color_type_23) => self.paint(gate, color_type_23),
                    None => {
                        let color = self.intern(parent_1, parent_2, child_2);
                        self.paint(gate, color);
                    }
                }
            }
            return;
        }

        if let Some(color) = color_type_31 {
            self.paint(gate, color);
            if let Some(second_child_two_color) = self.two_coloring.gate_color[child_2] {
                let (parent_1, parent_2) = self.two_coloring.colors[second_child_two_color].parents();
                match self.find_color_with_parents(child_1, parent_1, parent_2) {
                    Some(color_type_32) => self.paint(gate, color_type_32),
                    None => {
                        let color = self.intern(parent_1, parent_2, child_1);
                        self.paint(gate, color);
                    }
                }
            }
            return;
        }

        let first_child_two_color = self.two_coloring.gate_color[child_1];
        let second_child_two_color = self.two_coloring.gate_color[child_2];

        // Single 3-2 pattern: a color on child_1 covering child_2's pair.
        if let Some(two) = second_child_two_color {
            let (parent_1, parent_2) = self.two_coloring.colors[two].parents();
            if let Some(color) = self.find_color_with_parents(child_1, parent_1, parent_2) {
                self.paint(gate, color);
                return;
            }
        }

        // Single 2-3 pattern: a color on child_2 covering child_1's pair.
        if let Some(two) = first_child_two_color {
            let (parent_1, parent_2) = self.two_coloring.colors[two].parents();
            if let Some(color) = self.find_color_with_parents(child_2, parent_1, parent_2) {
                self.paint(gate, color);
                return;
            }
        }

        // 2-2 pattern: both children colored but no three-color on either.
        if let (Some(first), Some(second)) = (first_child_two_color, second_child_two_color) {
            let (parent_1, parent_2) = self.two_coloring.colors[first].parents();
            let (parent_3, parent_4) = self.two_coloring.colors[second].parents();
            if self.two_coloring.colors[second].has_parent(parent_1) {
                let color = self.intern(parent_2, parent_3, parent_4);
                self.paint(gate, color);
            } else if self.two_coloring.colors[second].has_parent(parent_2) {
                let color = self.intern(parent_1, parent_3, parent_4);
                self.paint(gate, color);
            } else {
                // Disjoint pairs: root a triple through each child.
                let color = self.intern(parent_1, parent_2, child_2);
                self.paint(gate, color);
                let color = self.intern(parent_3, parent_4, child_1);
                self.paint(gate, color);
            }
            return;
        }

        // Exactly one child is colored: its pair plus the other child.
        let color = if let Some(first) = first_child_two_color {
            let (parent_1, parent_2) = self.two_coloring.colors[first].parents();
            self.intern(parent_1, parent_2, child_2)
        } else {
            let second = second_child_two_color
                .expect("at least one two-color parent must be colored here");
            let (parent_1, parent_2) = self.two_coloring.colors[second].parents();
            self.intern(parent_1, parent_2, child_1)
        };
        self.paint(gate, color);
    }

    /// First color in `gate`'s list whose parent triple contains both
    /// `parent_1` and `parent_2`.
    fn find_color_with_parents(
        &self,
        gate: GateId,
        parent_1: GateId,
        parent_2: GateId,
    ) -> Option<ColorId> {
        self.gate_colors[gate].iter().copied().find(|&color| {
            self.colors[color].has_parent(parent_1) && self.colors[color].has_parent(parent_2)
        })
    }

    /// Returns the color of the sorted triple, creating it if new.
    fn intern(&mut self, a: GateId, b: GateId, c: GateId) -> ColorId {
        let key = sorted_triple(a, b, c);
        if let Some(&color) = self.parents_to_color.get(&key) {
            return color;
        }
        let color = self.colors.len();
        self.colors.push(ThreeColor::new(key));
        self.parents_to_color.insert(key, color);
        color
    }

    fn paint(&mut self, gate: GateId, color: ColorId) {
        self.colors[color].gates.push(gate);
        self.gate_colors[gate].push(color);
    }

    pub fn color_count(&self) -> usize {
        self.colors.len()
    }

    /// Up to two colors of `gate`, in paint order.
    pub fn colors_of(&self, gate: GateId) -> &[ColorId] {
        &self.gate_colors[gate]
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::circuit::Circuit;
    use crate::test_utils::{setup_diamond, setup_fan_in};

    fn init_logging() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    /// Ancestor set of `gate` (operand edges, any depth).
    fn ancestors(view: &impl CircuitView, gate: GateId) -> HashSet<GateId> {
        let mut seen = HashSet::new();
        let mut worklist: Vec<GateId> = view.operands(gate).to_vec();
        while let Some(current) = worklist.pop() {
            if seen.insert(current) {
                worklist.extend(view.operands(current));
            }
        }
        seen
    }

    fn assert_coloring_invariants(view: &impl CircuitView, coloring: &ThreeColoring) {
        for gate in 0..view.gate_count() {
            let colors = coloring.colors_of(gate);
            assert!(colors.len() <= 2, "gate {} has {} colors", gate, colors.len());
            if view.operands(gate).len() == 2 {
                let ancestor_set = ancestors(view, gate);
                for &color in colors {
                    let parents = coloring.colors[color].parents();
                    assert!(parents[0] < parents[1] && parents[1] < parents[2]);
                    for parent in parents {
                        assert!(
                            ancestor_set.contains(&parent),
                            "color parent {} is not an ancestor of gate {}",
                            parent,
                            gate
                        );
                    }
                }
            }
            if coloring.two_coloring.color_of(gate).is_none() {
                assert!(colors.is_empty());
            }
        }
    }

    #[test]
    fn trivial_and_has_no_three_colors() {
        init_logging();
        let mut c = Circuit::new();
        let i0 = c.add_gate(GateType::Input, vec![]);
        let i1 = c.add_gate(GateType::Input, vec![]);
        let a = c.add_gate(GateType::And, vec![i0, i1]);
        c.mark_output(a);

        let coloring = ThreeColoring::build(&c).unwrap();
        assert_eq!(coloring.color_count(), 0);
        assert_eq!(coloring.colors_of(a), &[] as &[ColorId]);
        assert_eq!(coloring.two_coloring.color_count(), 1);
    }

    #[test]
    fn negation_user_is_recorded_and_colors_inherited() {
        init_logging();
        let mut c = Circuit::new();
        let i0 = c.add_gate(GateType::Input, vec![]);
        let i1 = c.add_gate(GateType::Input, vec![]);
        let a = c.add_gate(GateType::And, vec![i0, i1]);
        let n = c.add_gate(GateType::Not, vec![a]);
        c.mark_output(n);

        let coloring = ThreeColoring::build(&c).unwrap();
        assert_eq!(coloring.negation_users[a], Some(n));
        assert_eq!(coloring.negation_users[i0], None);
        assert_eq!(
            coloring.two_coloring.color_of(n),
            coloring.two_coloring.color_of(a)
        );
    }

    #[test]
    fn buff_passes_colors_through_without_negation_user() {
        init_logging();
        let f = setup_fan_in();
        let mut g = f.g;
        let buff = g.add_gate(GateType::Buff, vec![f.root]);
        g.mark_output(buff);

        let coloring = ThreeColoring::build(&g).unwrap();
        assert_eq!(coloring.colors_of(buff), coloring.colors_of(f.root));
        assert_eq!(coloring.negation_users[f.root], None);
    }

    #[test]
    fn fan_in_synthesizes_the_input_triple() {
        init_logging();
        let f = setup_fan_in();

        let coloring = ThreeColoring::build(&f.g).unwrap();
        assert_eq!(coloring.two_coloring.color_count(), 3);
        assert_eq!(coloring.color_count(), 1);
        assert_eq!(coloring.colors[0].parents(), f.inputs);
        assert_eq!(coloring.colors_of(f.root), &[0]);
        assert_eq!(coloring.colors[0].gates(), &[f.root]);
        assert_coloring_invariants(&f.g, &coloring);
    }

    #[test]
    fn diamond_paints_mid_and_root_with_the_input_triple() {
        init_logging();
        let d = setup_diamond();

        let coloring = ThreeColoring::build(&d.g).unwrap();
        // One triple over the inputs, synthesized at `mid` and re-matched
        // at `root` through the single 2-3 pattern.
        assert_eq!(coloring.color_count(), 1);
        assert_eq!(coloring.colors[0].parents(), d.inputs);
        assert_eq!(coloring.colors_of(d.mid), &[0]);
        assert_eq!(coloring.colors_of(d.root), &[0]);
        assert_eq!(coloring.colors[0].gates(), &[d.mid, d.root]);
        assert_coloring_invariants(&d.g, &coloring);
    }

    #[test]
    fn disjoint_pairs_paint_two_triples() {
        init_logging();
        let mut c = Circuit::new();
        let inputs: Vec<GateId> = (0..4).map(|_| c.add_gate(GateType::Input, vec![])).collect();
        let left = c.add_gate(GateType::And, vec![inputs[0], inputs[1]]);
        let right = c.add_gate(GateType::And, vec![inputs[2], inputs[3]]);
        let root = c.add_gate(GateType::And, vec![left, right]);
        c.mark_output(root);

        let coloring = ThreeColoring::build(&c).unwrap();
        // 2-2 pattern with no shared parent: one triple through each child.
        assert_eq!(coloring.color_count(), 2);
        assert_eq!(
            coloring.colors[0].parents(),
            sorted_triple(inputs[0], inputs[1], right)
        );
        assert_eq!(
            coloring.colors[1].parents(),
            sorted_triple(inputs[2], inputs[3], left)
        );
        assert_eq!(coloring.colors_of(root), &[0, 1]);
        assert_coloring_invariants(&c, &coloring);
    }

    #[test]
    fn single_colored_child_roots_through_the_other() {
        init_logging();
        let mut c = Circuit::new();
        let i0 = c.add_gate(GateType::Input, vec![]);
        let i1 = c.add_gate(GateType::Input, vec![]);
        let i2 = c.add_gate(GateType::Input, vec![]);
        let a = c.add_gate(GateType::And, vec![i0, i1]);
        let root = c.add_gate(GateType::And, vec![a, i2]);
        c.mark_output(root);

        let coloring = ThreeColoring::build(&c).unwrap();
        // Fallback: `a`'s pair plus the uncolored child.
        assert_eq!(coloring.color_count(), 1);
        assert_eq!(coloring.colors[0].parents(), sorted_triple(i0, i1, i2));
        assert_eq!(coloring.colors_of(root), &[0]);
        assert_coloring_invariants(&c, &coloring);
    }

    #[test]
    fn shared_pair_through_both_children_is_common() {
        init_logging();
        // Two identical sub-circuit roots over the same triple feed a
        // common user; the user inherits the triple from both sides.
        let mut c = Circuit::new();
        let i0 = c.add_gate(GateType::Input, vec![]);
        let i1 = c.add_gate(GateType::Input, vec![]);
        let i2 = c.add_gate(GateType::Input, vec![]);
        let a01 = c.add_gate(GateType::And, vec![i0, i1]);
        let a12 = c.add_gate(GateType::And, vec![i1, i2]);
        let left = c.add_gate(GateType::And, vec![a01, a12]);
        let right = c.add_gate(GateType::Or, vec![a01, a12]);
        let root = c.add_gate(GateType::And, vec![left, right]);
        c.mark_output(root);

        let coloring = ThreeColoring::build(&c).unwrap();
        // `left` and `right` share the two-color over (a01, a12) and both
        // synthesize the input triple; `root`'s children carry it as a
        // common color.
        let triple = coloring.parents_to_color[&sorted_triple(i0, i1, i2)];
        assert_eq!(coloring.colors_of(left), &[triple]);
        assert_eq!(coloring.colors_of(right), &[triple]);
        assert!(coloring.colors_of(root).contains(&triple));
        assert_coloring_invariants(&c, &coloring);
    }

    #[test]
    fn three_operand_gate_is_rejected() {
        init_logging();
        let mut c = Circuit::new();
        let i0 = c.add_gate(GateType::Input, vec![]);
        let i1 = c.add_gate(GateType::Input, vec![]);
        let i2 = c.add_gate(GateType::Input, vec![]);
        let m = c.add_gate(GateType::Mux, vec![i0, i1, i2]);
        c.mark_output(m);

        assert_eq!(
            ThreeColoring::build(&c),
            Err(ColoringError::TooManyOperands { gate: m })
        );
    }

    #[test]
    fn rebuild_is_identical() {
        init_logging();
        let d = setup_diamond();
        let first = ThreeColoring::build(&d.g).unwrap();
        let second = ThreeColoring::build(&d.g).unwrap();
        assert_eq!(first, second);
    }
}
