//! # dqm-expr
//!
//! Compiles cut strings such as `"pt > 6 && abs(eta) < 2.4"` once, at
//! configuration time, into selectors evaluated per object at run time.
//!
//! Identifiers are resolved against an explicit field table per object
//! type ([`Selectable`]); an unknown field is a compile error, never a
//! run-time surprise.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod expr;
pub mod fields;
pub mod selector;

pub use expr::CompiledExpr;
pub use fields::{Field, Selectable};
pub use selector::Selector;
