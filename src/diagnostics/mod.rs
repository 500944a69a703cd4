//! Model diagnostics: collinearity, subset selection and directional
//! agreement between models.

pub mod direction;
pub mod subsets;
pub mod vif;

pub use direction::{directional_effect, DirectionalEffect, SignCheck};
pub use subsets::{best_subsets, SubsetResult};
pub use vif::{vif, Vif};
