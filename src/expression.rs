use std::fmt;

use crate::compile::compile;
use crate::error::CompileError;
use crate::value::Value;

/// A rename formula in infix order, as the user built it.
///
/// Nothing here checks balance: an expression is allowed to be half written
/// between edits. [`Expression::compile`] is where it has to make sense.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Expression {
    values: Vec<Value>,
}

impl Expression {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, value: impl Into<Value>) {
        self.values.push(value.into());
    }

    pub fn pop(&mut self) -> Option<Value> {
        self.values.pop()
    }

    pub fn clear(&mut self) {
        self.values.clear();
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Converts to RPN, see [`compile`].
    pub fn compile(&self) -> Result<Vec<Value>, CompileError> {
        compile(&self.values)
    }
}

impl From<Vec<Value>> for Expression {
    fn from(values: Vec<Value>) -> Self {
        Self { values }
    }
}

impl FromIterator<Value> for Expression {
    fn from_iter<I: IntoIterator<Item = Value>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

/// Space separated tokens. The output parses back with [`Expression::parse`].
impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, value) in self.values.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{value}")?;
        }
        Ok(())
    }
}
