//! Expression evaluation for the Evaluator
//!
//! Operators follow JavaScript semantics closely enough for description
//! authors: `&&`/`||` short-circuit and return an operand, `+` concatenates
//! as soon as either side is a string, and `==` compares loosely.

use crate::ast::{BinaryOperator, Expression, Literal, UnaryOperator};
use crate::context::Entity;

use super::{EvalError, Evaluator, Value};

impl<'a> Evaluator<'a> {
    pub(super) fn evaluate_expression(&self, expression: &Expression) -> Result<Value<'a>, EvalError> {
        match expression {
            Expression::Literal(literal) => Ok(match literal {
                Literal::Null => Value::Null,
                Literal::Bool(b) => Value::Bool(*b),
                Literal::Number(n) => Value::Number(*n),
                Literal::Text(s) => Value::Text(s.clone()),
            }),
            Expression::Identifier(name) => self.resolve_identifier(name),
            Expression::Property(base, name) => {
                let base = self.evaluate_expression(base)?;
                self.get_property(&base, name)
            }
            Expression::Index(base, index) => {
                let base = self.evaluate_expression(base)?;
                let index = self.evaluate_expression(index)?;
                self.get_index(&base, &index)
            }
            Expression::Call(name, args) => {
                let args = self.evaluate_arguments(args)?;
                self.call_function(name, &args)
            }
            Expression::Method(base, name, args) => {
                let base = self.evaluate_expression(base)?;
                let args = self.evaluate_arguments(args)?;
                self.call_method(&base, name, &args)
            }
            Expression::Unary(operator, operand) => {
                let operand = self.evaluate_expression(operand)?;
                match operator {
                    UnaryOperator::Not => Ok(Value::Bool(!self.is_truthy(&operand))),
                    UnaryOperator::Negate => Ok(Value::Number(-self.to_number(&operand))),
                }
            }
            Expression::Binary(left, operator, right) => self.evaluate_binary(left, *operator, right),
            Expression::Conditional(condition, then, otherwise) => {
                let condition = self.evaluate_expression(condition)?;
                if self.is_truthy(&condition) {
                    self.evaluate_expression(then)
                } else {
                    self.evaluate_expression(otherwise)
                }
            }
        }
    }

    fn evaluate_arguments(&self, args: &[Expression]) -> Result<Vec<Value<'a>>, EvalError> {
        args.iter().map(|arg| self.evaluate_expression(arg)).collect()
    }

    fn resolve_identifier(&self, name: &str) -> Result<Value<'a>, EvalError> {
        match name {
            "this" | "container" => Ok(self.scope.receiver.into()),
            "player" => Ok(self.scope.player.map(Entity::Player).into()),
            "game" => Ok(Value::Entity(Entity::Game(self.scope.context))),
            _ => Err(EvalError::UndefinedIdentifier {
                name: name.to_string(),
            }),
        }
    }

    fn evaluate_binary(
        &self,
        left: &Expression,
        operator: BinaryOperator,
        right: &Expression,
    ) -> Result<Value<'a>, EvalError> {
        let left = self.evaluate_expression(left)?;

        match operator {
            BinaryOperator::And => {
                return if self.is_truthy(&left) {
                    self.evaluate_expression(right)
                } else {
                    Ok(left)
                };
            }
            BinaryOperator::Or => {
                return if self.is_truthy(&left) {
                    Ok(left)
                } else {
                    self.evaluate_expression(right)
                };
            }
            _ => {}
        }

        let right = self.evaluate_expression(right)?;
        let value = match operator {
            BinaryOperator::Equal => Value::Bool(self.loose_equals(&left, &right)),
            BinaryOperator::NotEqual => Value::Bool(!self.loose_equals(&left, &right)),
            BinaryOperator::StrictEqual => Value::Bool(self.strict_equals(&left, &right)),
            BinaryOperator::StrictNotEqual => Value::Bool(!self.strict_equals(&left, &right)),
            BinaryOperator::Less
            | BinaryOperator::LessEqual
            | BinaryOperator::Greater
            | BinaryOperator::GreaterEqual => {
                let Some(ordering) = self.compare_values(&left, &right) else {
                    return Ok(Value::Bool(false));
                };
                Value::Bool(match operator {
                    BinaryOperator::Less => ordering.is_lt(),
                    BinaryOperator::LessEqual => ordering.is_le(),
                    BinaryOperator::Greater => ordering.is_gt(),
                    _ => ordering.is_ge(),
                })
            }
            BinaryOperator::Add => {
                if matches!(left, Value::Text(_)) || matches!(right, Value::Text(_)) {
                    Value::Text(format!("{}{}", self.display(&left), self.display(&right)))
                } else {
                    Value::Number(self.to_number(&left) + self.to_number(&right))
                }
            }
            BinaryOperator::Subtract => Value::Number(self.to_number(&left) - self.to_number(&right)),
            BinaryOperator::Multiply => Value::Number(self.to_number(&left) * self.to_number(&right)),
            BinaryOperator::Divide => Value::Number(self.to_number(&left) / self.to_number(&right)),
            BinaryOperator::Remainder => Value::Number(self.to_number(&left) % self.to_number(&right)),
            BinaryOperator::And | BinaryOperator::Or => right,
        };
        Ok(value)
    }
}
