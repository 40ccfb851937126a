// SPDX-License-Identifier: Apache-2.0

//! Core of a Boolean-circuit simplification engine.
//!
//! The entry points are the two coloring passes and the pattern database:
//! - [`two_coloring::TwoColoring`] labels each gate with the pair of
//!   ancestor gates its value depends on.
//! - [`three_coloring::ThreeColoring`] composes those labels into
//!   three-ancestor sub-circuit candidates.
//! - [`pattern_db::PatternDb`] holds the precomputed optimal
//!   implementations that a rewriting pass substitutes for matched
//!   sub-circuits; [`db_registry::DbRegistry`] carries the per-basis
//!   handles down the call stack.
//!
//! Circuit parsing and the substitution pass itself live outside this
//! crate; they interact with it through [`circuit::CircuitView`] and the
//! coloring outputs.

pub mod circuit;
pub mod db_registry;
pub mod gate;
pub mod pattern_db;
pub mod test_utils;
pub mod three_coloring;
pub mod topo;
pub mod two_coloring;
