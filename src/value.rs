use std::fmt;

/// One element of a rename formula.
///
/// Operand kinds (`Int`, `Str`, `Format`, `Variable`) end up in compiled
/// programs; brackets only exist in the infix form.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Value {
    Int(i64),
    Str(String),
    /// Minimum digit count for zero-padding, see [`Operator::Mul`].
    Format(i64),
    Variable(VariableKind),
    OpenBracket,
    CloseBracket,
    Operator(Operator),
}

/// Per-item placeholder, replaced by [`bind`](fn@crate::bind).
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum VariableKind {
    /// Position of the file in the batch.
    Index,
    /// File name of the source path, without its directory.
    OriginFileName,
    /// A name nothing knows how to bind.
    Unknown(String),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Operator {
    Add,
    Sub,
    Mul,
    Div,
}

/// Discriminant of a [`Value`], used to key operator dispatch.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Int,
    Str,
    Format,
    Variable,
    OpenBracket,
    CloseBracket,
    Operator,
}

impl Value {
    pub fn kind(&self) -> ValueKind {
        match self {
            Self::Int(_) => ValueKind::Int,
            Self::Str(_) => ValueKind::Str,
            Self::Format(_) => ValueKind::Format,
            Self::Variable(_) => ValueKind::Variable,
            Self::OpenBracket => ValueKind::OpenBracket,
            Self::CloseBracket => ValueKind::CloseBracket,
            Self::Operator(_) => ValueKind::Operator,
        }
    }

    /// True for everything the compiler copies straight to its output.
    pub fn is_operand(&self) -> bool {
        matches!(
            self,
            Self::Int(_) | Self::Str(_) | Self::Format(_) | Self::Variable(_)
        )
    }

    pub fn string(value: impl Into<String>) -> Self {
        Self::Str(value.into())
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::Str(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl From<Operator> for Value {
    fn from(op: Operator) -> Self {
        Self::Operator(op)
    }
}

impl From<VariableKind> for Value {
    fn from(var: VariableKind) -> Self {
        Self::Variable(var)
    }
}

impl VariableKind {
    /// Maps a formula variable name (without the `$`) to its kind.
    pub fn from_name(name: &str) -> Self {
        match name {
            "index" => Self::Index,
            "name" => Self::OriginFileName,
            other => Self::Unknown(other.to_string()),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Index => "index",
            Self::OriginFileName => "name",
            Self::Unknown(name) => name,
        }
    }
}

impl Operator {
    /// Higher binds tighter.
    pub fn precedence(self) -> u8 {
        match self {
            Self::Add | Self::Sub => 1,
            Self::Mul | Self::Div => 2,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Add => "Add",
            Self::Sub => "Sub",
            Self::Mul => "Mul",
            Self::Div => "Div",
        }
    }

    pub fn symbol(self) -> char {
        match self {
            Self::Add => '+',
            Self::Sub => '-',
            Self::Mul => '*',
            Self::Div => '/',
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(value) => write!(f, "{value}"),
            Self::Str(value) => {
                f.write_str("\"")?;
                for c in value.chars() {
                    if c == '"' || c == '\\' {
                        f.write_str("\\")?;
                    }
                    write!(f, "{c}")?;
                }
                f.write_str("\"")
            }
            Self::Format(width) => write!(f, "#{width}"),
            Self::Variable(var) => write!(f, "${}", var.name()),
            Self::OpenBracket => f.write_str("("),
            Self::CloseBracket => f.write_str(")"),
            Self::Operator(op) => write!(f, "{}", op.symbol()),
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Int => "integer",
            Self::Str => "string",
            Self::Format => "format marker",
            Self::Variable => "variable",
            Self::OpenBracket => "open bracket",
            Self::CloseBracket => "close bracket",
            Self::Operator => "operator",
        })
    }
}
