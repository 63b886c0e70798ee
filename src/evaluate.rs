use crate::error::EvalError;
use crate::value::Value;

/// Reduces a bound RPN program to the text of its single result.
///
/// Operators pop their right operand first, then the left one. The program
/// must leave exactly one integer or string behind.
pub fn evaluate(rpn: &[Value]) -> Result<String, EvalError> {
    let mut stack: Vec<Value> = Vec::with_capacity(rpn.len());

    for value in rpn {
        match value {
            Value::Int(_) | Value::Str(_) | Value::Format(_) => stack.push(value.clone()),
            Value::Operator(op) => {
                let (Some(right), Some(left)) = (stack.pop(), stack.pop()) else {
                    return Err(EvalError::IllegalExpression);
                };
                stack.push(op.apply(left, right)?);
            }
            Value::Variable(var) => {
                return Err(EvalError::UnboundVariable(var.name().to_string()))
            }
            Value::OpenBracket | Value::CloseBracket => {
                return Err(EvalError::IllegalExpression)
            }
        }
    }

    if stack.len() != 1 {
        return Err(EvalError::IllegalExpression);
    }
    match stack.pop() {
        Some(Value::Int(value)) => Ok(value.to_string()),
        Some(Value::Str(value)) => Ok(value),
        Some(other) => Err(EvalError::NotRenderable(other.kind())),
        None => Err(EvalError::IllegalExpression),
    }
}
