use crate::error::EvalError;
use crate::value::{Value, VariableKind};

/// Replaces the per-item variables of a compiled program with literals for
/// one file.
///
/// `item_index` is the file's position in its batch and `source_path` its
/// current path. The input program is left untouched so it can be bound again
/// for the next file.
pub fn bind(rpn: &[Value], item_index: i64, source_path: &str) -> Result<Vec<Value>, EvalError> {
    rpn.iter()
        .map(|value| match value {
            Value::Variable(VariableKind::Index) => Ok(Value::Int(item_index)),
            Value::Variable(VariableKind::OriginFileName) => {
                Ok(Value::Str(file_name(source_path).to_string()))
            }
            Value::Variable(VariableKind::Unknown(name)) => {
                Err(EvalError::UnknownVariable(name.clone()))
            }
            other => Ok(other.clone()),
        })
        .collect()
}

/// The part of `path` after its last `/` or `\`.
pub fn file_name(path: &str) -> &str {
    match path.rfind(['/', '\\']) {
        Some(separator) => &path[separator + 1..],
        None => path,
    }
}

/// The part of `path` up to and including its last `/` or `\`.
pub fn directory_prefix(path: &str) -> &str {
    match path.rfind(['/', '\\']) {
        Some(separator) => &path[..=separator],
        None => "",
    }
}
