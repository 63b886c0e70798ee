use crate::error::CompileError;
use crate::value::{Operator, Value};

/// What the shunting-yard keeps on its operator stack.
#[derive(Clone, Copy, Debug)]
enum Pending {
    OpenBracket,
    Operator(Operator),
}

/// Converts an infix expression into RPN.
///
/// Brackets are consumed; operands keep their relative order and operators are
/// emitted once both of their operands are. Operators of equal precedence
/// associate to the left. The operand/operator balance is only checked after
/// the whole pass, so the error reports the expression as a whole.
#[tracing::instrument(level = "debug", skip_all, fields(len = expression.len()))]
pub fn compile(expression: &[Value]) -> Result<Vec<Value>, CompileError> {
    let mut output = Vec::with_capacity(expression.len());
    let mut stack: Vec<Pending> = Vec::new();
    let mut operands = 0usize;
    let mut operators = 0usize;

    for value in expression {
        match value {
            Value::Int(_) | Value::Str(_) | Value::Format(_) | Value::Variable(_) => {
                output.push(value.clone());
                operands += 1;
            }
            Value::OpenBracket => stack.push(Pending::OpenBracket),
            Value::CloseBracket => loop {
                match stack.pop() {
                    Some(Pending::OpenBracket) => break,
                    Some(Pending::Operator(op)) => {
                        output.push(Value::Operator(op));
                        operators += 1;
                    }
                    None => return Err(CompileError::BracketMismatch),
                }
            },
            Value::Operator(op) => {
                while let Some(&Pending::Operator(top)) = stack.last() {
                    if top.precedence() < op.precedence() {
                        break;
                    }
                    stack.pop();
                    output.push(Value::Operator(top));
                    operators += 1;
                }
                stack.push(Pending::Operator(*op));
            }
        }
    }

    while let Some(pending) = stack.pop() {
        match pending {
            Pending::OpenBracket => return Err(CompileError::BracketMismatch),
            Pending::Operator(op) => {
                output.push(Value::Operator(op));
                operators += 1;
            }
        }
    }

    if operands > operators + 1 {
        return Err(CompileError::MissingOperator);
    }
    if operands < operators + 1 {
        return Err(CompileError::ExcessOperator);
    }

    tracing::debug!(operands, operators, "compiled expression");
    Ok(output)
}
