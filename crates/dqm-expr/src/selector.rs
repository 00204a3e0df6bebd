//! Typed selectors: a compiled cut bound to a field table.

use std::fmt;

use dqm_core::{Error, Result};

use crate::expr::CompiledExpr;
use crate::fields::Selectable;

/// A cut string compiled for objects of type `T`.
///
/// Compilation resolves every identifier against `T::FIELDS`; evaluation
/// cannot fail.
pub struct Selector<T> {
    source: String,
    expr: CompiledExpr,
    accessors: Vec<fn(&T) -> f64>,
}

impl<T: Selectable> Selector<T> {
    /// Compile `source` for `T`.
    pub fn compile(source: &str) -> Result<Self> {
        let expr = CompiledExpr::compile(source)?;
        let accessors = expr
            .variables
            .iter()
            .map(|name| {
                T::field(name).ok_or_else(|| {
                    let known: Vec<&str> = T::FIELDS.iter().map(|f| f.name).collect();
                    Error::Expression(format!(
                        "unknown {} field '{name}' in '{source}' (known: {})",
                        T::KIND,
                        known.join(", ")
                    ))
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { source: source.to_string(), expr, accessors })
    }

    /// True when `obj` passes the cut.
    pub fn accept(&self, obj: &T) -> bool {
        self.expr.eval_with(&|i| (self.accessors[i])(obj)) > 0.0
    }

    /// Objects passing the cut, in input order.
    pub fn filter<'a>(&self, objs: &'a [T]) -> Vec<&'a T> {
        objs.iter().filter(|o| self.accept(o)).collect()
    }

    /// The cut string this selector was compiled from.
    pub fn source(&self) -> &str {
        &self.source
    }
}

impl<T> fmt::Debug for Selector<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Selector").field("source", &self.source).finish()
    }
}
