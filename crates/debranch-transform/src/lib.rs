//! The debranch core: partial evaluation and dead-branch elimination.
//!
//! Four pure decision procedures and two rewrites:
//! - [`evaluator`] — is an expression a compile-time constant, and what is
//!   its value?
//! - [`effects`] — can evaluating an expression observably affect anything?
//! - [`truthiness`] — tri-valued (true / false / indeterminate) truthiness
//!   of an expression under the known-constants environment.
//! - [`branch`] — the `if`-statement rewrite built on the three above.
//! - [`substitute`] — replace known-constant identifiers with literals.
//! - [`flatten`] — splice nested blocks produced by branch collapses.
//!
//! Everything is conservative: when a value cannot be proven at compile
//! time the answer is "indeterminate" or "has an effect" and the tree is
//! left alone. A wrong collapse silently corrupts the emitted program; a
//! missed one only costs bytes.

use debranch_parser::ast::Value;
use rustc_hash::FxHashMap;

pub mod branch;
pub mod effects;
pub mod evaluator;
pub mod flatten;
pub mod substitute;
pub mod truthiness;

pub use branch::eliminate_branches;
pub use effects::has_side_effect;
pub use evaluator::{constant_value, evaluate, is_constant};
pub use flatten::flatten_blocks;
pub use substitute::substitute;
pub use truthiness::{Truthiness, boolean_condition};

/// The known-constants environment: identifier name to literal value,
/// supplied once per transform invocation and never mutated during it.
///
/// Absence of a name means "not statically known", not "undefined".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct KnownVars {
    map: FxHashMap<String, Value>,
}

impl KnownVars {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `name` to a literal value for the duration of a transform.
    pub fn define(&mut self, name: impl Into<String>, value: Value) -> &mut Self {
        self.map.insert(name.into(), value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.map.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.map.contains_key(name)
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }
}

impl FromIterator<(String, Value)> for KnownVars {
    fn from_iter<T: IntoIterator<Item = (String, Value)>>(iter: T) -> Self {
        Self {
            map: iter.into_iter().collect(),
        }
    }
}
