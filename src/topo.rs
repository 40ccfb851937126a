// SPDX-License-Identifier: Apache-2.0

//! Deterministic topological ordering of a circuit view.

use crate::circuit::CircuitView;
use crate::gate::GateId;

/// Returns a post-order traversal of all gates reachable from the view's
/// outputs: every gate appears after all of its operands.
///
/// Ties (several output roots, the two operands of a gate) break by
/// ascending gate id, so the order is a pure function of the view. Gates
/// unreachable from any output are omitted.
pub fn post_order(view: &impl CircuitView) -> Vec<GateId> {
    let mut worklist: Vec<GateId> = Vec::new();
    let mut visited = vec![false; view.gate_count()];
    let mut order: Vec<GateId> = Vec::with_capacity(view.gate_count());

    let mut roots: Vec<GateId> = view.outputs().to_vec();
    roots.sort_unstable();
    roots.dedup();
    // Stack discipline: push in descending id order so the smallest root is
    // explored first.
    worklist.extend(roots.iter().rev());

    while let Some(current) = worklist.pop() {
        if visited[current] {
            continue;
        }
        let mut operands: Vec<GateId> = view.operands(current).to_vec();
        operands.sort_unstable();
        let mut all_deps_visited = true;
        for &dep in &operands {
            if !visited[dep] {
                worklist.push(current); // Revisit after dependencies
                worklist.push(dep);
                all_deps_visited = false;
                break;
            }
        }
        if all_deps_visited {
            visited[current] = true;
            order.push(current);
        }
    }
    order
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::test_utils::{setup_diamond, setup_fan_in};

    fn assert_operands_precede_users(view: &impl CircuitView, order: &[GateId]) {
        let mut position = vec![usize::MAX; view.gate_count()];
        for (i, &gate) in order.iter().enumerate() {
            position[gate] = i;
        }
        for &gate in order {
            for &op in view.operands(gate) {
                assert!(
                    position[op] < position[gate],
                    "operand {} must precede gate {}",
                    op,
                    gate
                );
            }
        }
    }

    #[test]
    fn fan_in_order_is_operands_first() {
        let f = setup_fan_in();
        let order = post_order(&f.g);
        assert_eq!(order, vec![0, 1, 3, 2, 4, 5]);
        assert_operands_precede_users(&f.g, &order);
    }

    #[test]
    fn diamond_order_is_operands_first_and_stable() {
        let d = setup_diamond();
        let order = post_order(&d.g);
        assert_operands_precede_users(&d.g, &order);
        assert_eq!(order, post_order(&d.g));
        assert_eq!(order.len(), d.g.gate_count());
    }

    #[test]
    fn unreachable_gates_are_omitted() {
        use crate::circuit::Circuit;
        use crate::gate::GateType;

        let mut c = Circuit::new();
        let i0 = c.add_gate(GateType::Input, vec![]);
        let i1 = c.add_gate(GateType::Input, vec![]);
        let used = c.add_gate(GateType::And, vec![i0, i1]);
        let _dangling = c.add_gate(GateType::Or, vec![i0, i1]);
        c.mark_output(used);

        let order = post_order(&c);
        assert_eq!(order, vec![i0, i1, used]);
    }
}
