use std::path::PathBuf;

use thiserror::Error;

use crate::value::{Operator, ValueKind};

/// Raised while converting an infix expression to RPN.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CompileError {
    #[error("bracket mismatch")]
    BracketMismatch,

    #[error("missing operator")]
    MissingOperator,

    #[error("excess operator")]
    ExcessOperator,
}

/// No dispatch entry exists for the operand kinds an operator received.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("illegal operator {} ({left} {} {right})", .operator.name(), .operator.symbol())]
pub struct TypeError {
    pub operator: Operator,
    pub left: ValueKind,
    pub right: ValueKind,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EvalError {
    #[error("illegal expression")]
    IllegalExpression,

    #[error("unknown variable ${0}")]
    UnknownVariable(String),

    #[error("unbound variable ${0}")]
    UnboundVariable(String),

    #[error("a {0} cannot be rendered as a file name")]
    NotRenderable(ValueKind),

    #[error(transparent)]
    Type(#[from] TypeError),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FsError {
    #[error("source file not found: {}", .0.display())]
    SourceMissing(PathBuf),

    #[error("destination already exists: {}", .0.display())]
    DestinationExists(PathBuf),

    #[error("invalid file name {0:?}")]
    InvalidName(String),

    /// Carries the native error text of the failed rename.
    #[error("failed to rename {} to {}: {message}", .from.display(), .to.display())]
    Io {
        from: PathBuf,
        to: PathBuf,
        message: String,
    },
}

/// Everything that can stop a batch.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RenameError {
    #[error(transparent)]
    Compile(#[from] CompileError),

    #[error(transparent)]
    Eval(#[from] EvalError),

    #[error(transparent)]
    Fs(#[from] FsError),
}

impl From<TypeError> for RenameError {
    fn from(err: TypeError) -> Self {
        Self::Eval(EvalError::Type(err))
    }
}
