/// Parser for the small expression language used in `cond` and `v` attributes
///
/// Supported: literals, identifiers, property access, indexing, calls to
/// whitelisted functions, method calls, unary `!`/`-`, arithmetic,
/// comparisons, `&&`/`||` and the ternary operator. Assignment is not part
/// of the grammar.
use crate::ast::{BinaryOperator, Expression, Literal, UnaryOperator};
use crate::span::Span;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ExpressionError {
    #[error("unexpected end of expression")]
    UnexpectedEnd { span: Span },
    #[error("unexpected '{found}'")]
    UnexpectedToken { found: char, span: Span },
    #[error("expected '{expected}'")]
    Expected { expected: char, span: Span },
    #[error("unterminated string")]
    UnterminatedString { span: Span },
    #[error("invalid number '{text}'")]
    InvalidNumber { text: String, span: Span },
    #[error("expression is too deeply nested")]
    TooDeep { span: Span },
}

impl ExpressionError {
    pub fn span(&self) -> Span {
        match self {
            ExpressionError::UnexpectedEnd { span }
            | ExpressionError::UnexpectedToken { span, .. }
            | ExpressionError::Expected { span, .. }
            | ExpressionError::UnterminatedString { span }
            | ExpressionError::InvalidNumber { span, .. }
            | ExpressionError::TooDeep { span } => *span,
        }
    }
}

/// Bound on both bracket/operator nesting and the number of compound nodes,
/// which together bound the depth of the tree the evaluator walks
const MAX_NESTING: usize = 64;
const MAX_COMPOUND_NODES: usize = 256;

pub fn parse_expression(source: &str) -> Result<Expression, ExpressionError> {
    ExpressionParser::new(source).parse()
}

struct ExpressionParser {
    input: Vec<char>,
    pos: usize,
    depth: usize,
    compound_nodes: usize,
}

impl ExpressionParser {
    fn new(source: &str) -> Self {
        ExpressionParser {
            input: source.chars().collect(),
            pos: 0,
            depth: 0,
            compound_nodes: 0,
        }
    }

    /// Run a sub-parser one nesting level down
    fn nested<T>(
        &mut self,
        parse: impl FnOnce(&mut Self) -> Result<T, ExpressionError>,
    ) -> Result<T, ExpressionError> {
        if self.depth >= MAX_NESTING {
            return Err(self.too_deep());
        }
        self.depth += 1;
        let result = parse(self);
        self.depth -= 1;
        result
    }

    /// Count a node that wraps other nodes
    fn grow(&mut self) -> Result<(), ExpressionError> {
        self.compound_nodes += 1;
        if self.compound_nodes > MAX_COMPOUND_NODES {
            return Err(self.too_deep());
        }
        Ok(())
    }

    fn too_deep(&self) -> ExpressionError {
        ExpressionError::TooDeep {
            span: Span::new(self.pos, self.pos),
        }
    }

    fn parse(&mut self) -> Result<Expression, ExpressionError> {
        let expression = self.parse_ternary()?;
        self.skip_whitespace();
        match self.peek_char() {
            None => Ok(expression),
            Some(found) => Err(ExpressionError::UnexpectedToken {
                found,
                span: Span::new(self.pos, self.pos + 1),
            }),
        }
    }

    fn parse_ternary(&mut self) -> Result<Expression, ExpressionError> {
        let condition = self.parse_or()?;
        if !self.eat("?") {
            return Ok(condition);
        }
        let then = self.nested(Self::parse_ternary)?;
        self.expect(':')?;
        let otherwise = self.nested(Self::parse_ternary)?;
        self.grow()?;
        Ok(Expression::Conditional(
            Box::new(condition),
            Box::new(then),
            Box::new(otherwise),
        ))
    }

    fn parse_or(&mut self) -> Result<Expression, ExpressionError> {
        let mut left = self.parse_and()?;
        while self.eat("||") {
            let right = self.parse_and()?;
            self.grow()?;
            left = binary(left, BinaryOperator::Or, right);
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<Expression, ExpressionError> {
        let mut left = self.parse_equality()?;
        while self.eat("&&") {
            let right = self.parse_equality()?;
            self.grow()?;
            left = binary(left, BinaryOperator::And, right);
        }
        Ok(left)
    }

    fn parse_equality(&mut self) -> Result<Expression, ExpressionError> {
        let mut left = self.parse_comparison()?;
        loop {
            let operator = if self.eat("===") {
                BinaryOperator::StrictEqual
            } else if self.eat("!==") {
                BinaryOperator::StrictNotEqual
            } else if self.eat("==") {
                BinaryOperator::Equal
            } else if self.eat("!=") {
                BinaryOperator::NotEqual
            } else {
                return Ok(left);
            };
            let right = self.parse_comparison()?;
            self.grow()?;
            left = binary(left, operator, right);
        }
    }

    fn parse_comparison(&mut self) -> Result<Expression, ExpressionError> {
        let mut left = self.parse_additive()?;
        loop {
            let operator = if self.eat("<=") {
                BinaryOperator::LessEqual
            } else if self.eat(">=") {
                BinaryOperator::GreaterEqual
            } else if self.eat("<") {
                BinaryOperator::Less
            } else if self.eat(">") {
                BinaryOperator::Greater
            } else {
                return Ok(left);
            };
            let right = self.parse_additive()?;
            self.grow()?;
            left = binary(left, operator, right);
        }
    }

    fn parse_additive(&mut self) -> Result<Expression, ExpressionError> {
        let mut left = self.parse_multiplicative()?;
        loop {
            let operator = if self.eat("+") {
                BinaryOperator::Add
            } else if self.eat("-") {
                BinaryOperator::Subtract
            } else {
                return Ok(left);
            };
            let right = self.parse_multiplicative()?;
            self.grow()?;
            left = binary(left, operator, right);
        }
    }

    fn parse_multiplicative(&mut self) -> Result<Expression, ExpressionError> {
        let mut left = self.parse_unary()?;
        loop {
            let operator = if self.eat("*") {
                BinaryOperator::Multiply
            } else if self.eat("/") {
                BinaryOperator::Divide
            } else if self.eat("%") {
                BinaryOperator::Remainder
            } else {
                return Ok(left);
            };
            let right = self.parse_unary()?;
            self.grow()?;
            left = binary(left, operator, right);
        }
    }

    fn parse_unary(&mut self) -> Result<Expression, ExpressionError> {
        self.skip_whitespace();
        if self.peek_char() == Some('!') && self.peek_ahead(1) != Some('=') {
            self.advance();
            let operand = self.nested(Self::parse_unary)?;
            self.grow()?;
            return Ok(Expression::Unary(UnaryOperator::Not, Box::new(operand)));
        }
        if self.peek_char() == Some('-') {
            self.advance();
            let operand = self.nested(Self::parse_unary)?;
            self.grow()?;
            return Ok(Expression::Unary(UnaryOperator::Negate, Box::new(operand)));
        }
        self.parse_postfix()
    }

    fn parse_postfix(&mut self) -> Result<Expression, ExpressionError> {
        let mut expression = self.parse_primary()?;
        loop {
            self.skip_whitespace();
            match self.peek_char() {
                Some('.') => {
                    self.advance();
                    self.skip_whitespace();
                    let name = self.parse_identifier()?;
                    self.skip_whitespace();
                    self.grow()?;
                    if self.peek_char() == Some('(') {
                        let args = self.parse_arguments()?;
                        expression = Expression::Method(Box::new(expression), name, args);
                    } else {
                        expression = Expression::Property(Box::new(expression), name);
                    }
                }
                Some('[') => {
                    self.advance();
                    let index = self.nested(Self::parse_ternary)?;
                    self.expect(']')?;
                    self.grow()?;
                    expression = Expression::Index(Box::new(expression), Box::new(index));
                }
                _ => return Ok(expression),
            }
        }
    }

    fn parse_primary(&mut self) -> Result<Expression, ExpressionError> {
        self.skip_whitespace();
        match self.peek_char() {
            None => Err(ExpressionError::UnexpectedEnd {
                span: Span::new(self.pos, self.pos),
            }),
            Some('(') => {
                self.advance();
                let inner = self.nested(Self::parse_ternary)?;
                self.expect(')')?;
                Ok(inner)
            }
            Some(quote @ ('"' | '\'')) => self.parse_string(quote),
            Some(c) if c.is_ascii_digit() => self.parse_number(),
            Some(c) if is_identifier_start(c) => {
                let name = self.parse_identifier()?;
                match name.as_str() {
                    "true" => return Ok(Expression::Literal(Literal::Bool(true))),
                    "false" => return Ok(Expression::Literal(Literal::Bool(false))),
                    "null" | "undefined" => return Ok(Expression::Literal(Literal::Null)),
                    _ => {}
                }
                self.skip_whitespace();
                if self.peek_char() == Some('(') {
                    let args = self.parse_arguments()?;
                    self.grow()?;
                    Ok(Expression::Call(name, args))
                } else {
                    Ok(Expression::Identifier(name))
                }
            }
            Some(found) => Err(ExpressionError::UnexpectedToken {
                found,
                span: Span::new(self.pos, self.pos + 1),
            }),
        }
    }

    fn parse_arguments(&mut self) -> Result<Vec<Expression>, ExpressionError> {
        self.expect('(')?;
        let mut args = Vec::new();
        self.skip_whitespace();
        if self.eat(")") {
            return Ok(args);
        }
        loop {
            args.push(self.nested(Self::parse_ternary)?);
            self.skip_whitespace();
            if self.eat(",") {
                continue;
            }
            self.expect(')')?;
            return Ok(args);
        }
    }

    fn parse_string(&mut self, quote: char) -> Result<Expression, ExpressionError> {
        let start = self.pos;
        self.advance();
        let mut text = String::new();
        loop {
            match self.peek_char() {
                None => {
                    return Err(ExpressionError::UnterminatedString {
                        span: Span::new(start, self.pos),
                    })
                }
                Some(ch) if ch == quote => {
                    self.advance();
                    return Ok(Expression::Literal(Literal::Text(text)));
                }
                Some('\\') => {
                    self.advance();
                    match self.peek_char() {
                        Some('n') => text.push('\n'),
                        Some('t') => text.push('\t'),
                        Some(other) => text.push(other),
                        None => continue,
                    }
                    self.advance();
                }
                Some(ch) => {
                    text.push(ch);
                    self.advance();
                }
            }
        }
    }

    fn parse_number(&mut self) -> Result<Expression, ExpressionError> {
        let start = self.pos;
        let mut text = String::new();
        while let Some(ch) = self.peek_char() {
            if ch.is_ascii_digit() || ch == '.' {
                text.push(ch);
                self.advance();
            } else {
                break;
            }
        }
        text.parse::<f64>()
            .map(|n| Expression::Literal(Literal::Number(n)))
            .map_err(|_| ExpressionError::InvalidNumber {
                text,
                span: Span::new(start, self.pos),
            })
    }

    fn parse_identifier(&mut self) -> Result<String, ExpressionError> {
        let mut name = String::new();
        while let Some(ch) = self.peek_char() {
            if is_identifier_start(ch) || ch.is_ascii_digit() {
                name.push(ch);
                self.advance();
            } else {
                break;
            }
        }
        if name.is_empty() {
            return Err(match self.peek_char() {
                Some(found) => ExpressionError::UnexpectedToken {
                    found,
                    span: Span::new(self.pos, self.pos + 1),
                },
                None => ExpressionError::UnexpectedEnd {
                    span: Span::new(self.pos, self.pos),
                },
            });
        }
        Ok(name)
    }

    fn expect(&mut self, expected: char) -> Result<(), ExpressionError> {
        self.skip_whitespace();
        if self.peek_char() == Some(expected) {
            self.advance();
            Ok(())
        } else if self.peek_char().is_none() {
            Err(ExpressionError::UnexpectedEnd {
                span: Span::new(self.pos, self.pos),
            })
        } else {
            Err(ExpressionError::Expected {
                expected,
                span: Span::new(self.pos, self.pos + 1),
            })
        }
    }

    /// Consume `token` if it comes next, skipping leading whitespace.
    /// Single-character operators do not match the start of a longer one.
    fn eat(&mut self, token: &str) -> bool {
        self.skip_whitespace();
        let matches = token
            .chars()
            .enumerate()
            .all(|(offset, ch)| self.peek_ahead(offset) == Some(ch));
        if !matches {
            return false;
        }
        let len = token.chars().count();
        if matches!(token, "<" | ">" | "==" | "!=") && self.peek_ahead(len) == Some('=') {
            return false;
        }
        self.pos += len;
        true
    }

    fn skip_whitespace(&mut self) {
        while let Some(ch) = self.peek_char() {
            if ch.is_whitespace() {
                self.advance();
            } else {
                break;
            }
        }
    }

    fn peek_char(&self) -> Option<char> {
        self.input.get(self.pos).copied()
    }

    fn peek_ahead(&self, offset: usize) -> Option<char> {
        self.input.get(self.pos + offset).copied()
    }

    fn advance(&mut self) {
        if self.pos < self.input.len() {
            self.pos += 1;
        }
    }
}

fn binary(left: Expression, operator: BinaryOperator, right: Expression) -> Expression {
    Expression::Binary(Box::new(left), operator, Box::new(right))
}

fn is_identifier_start(ch: char) -> bool {
    ch.is_ascii_alphabetic() || ch == '_' || ch == '$'
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ident(name: &str) -> Expression {
        Expression::Identifier(name.to_string())
    }

    #[test]
    fn test_property_comparison() {
        let expr = parse_expression("this.quantity > 1").unwrap();
        assert_eq!(
            expr,
            Expression::Binary(
                Box::new(Expression::Property(Box::new(ident("this")), "quantity".to_string())),
                BinaryOperator::Greater,
                Box::new(Expression::Literal(Literal::Number(1.0))),
            )
        );
    }

    #[test]
    fn test_precedence() {
        let expr = parse_expression("a || b && !c").unwrap();
        assert_eq!(
            expr,
            Expression::Binary(
                Box::new(ident("a")),
                BinaryOperator::Or,
                Box::new(Expression::Binary(
                    Box::new(ident("b")),
                    BinaryOperator::And,
                    Box::new(Expression::Unary(UnaryOperator::Not, Box::new(ident("c")))),
                )),
            )
        );
    }

    #[test]
    fn test_strict_equality_and_call() {
        let expr = parse_expression(r#"findPuzzle('SAFE').outcome === "open""#).unwrap();
        match expr {
            Expression::Binary(left, BinaryOperator::StrictEqual, right) => {
                assert_eq!(
                    *left,
                    Expression::Property(
                        Box::new(Expression::Call(
                            "findPuzzle".to_string(),
                            vec![Expression::Literal(Literal::Text("SAFE".to_string()))]
                        )),
                        "outcome".to_string()
                    )
                );
                assert_eq!(*right, Expression::Literal(Literal::Text("open".to_string())));
            }
            other => panic!("unexpected expression: {:?}", other),
        }
    }

    #[test]
    fn test_method_and_ternary() {
        let expr = parse_expression("player.hasAttribute('hidden') ? 'yes' : 'no'").unwrap();
        assert!(matches!(expr, Expression::Conditional(..)));
    }

    #[test]
    fn test_assignment_rejected() {
        let err = parse_expression("this.accessible = false").unwrap_err();
        assert!(matches!(err, ExpressionError::UnexpectedToken { found: '=', .. }));
    }

    #[test]
    fn test_unterminated_string() {
        let err = parse_expression("this.name === 'DOOR").unwrap_err();
        assert!(matches!(err, ExpressionError::UnterminatedString { .. }));
        assert_eq!(err.span().start, 14);
    }

    #[test]
    fn test_deep_nesting_rejected() {
        let source = format!("{}1{}", "(".repeat(20_000), ")".repeat(20_000));
        let err = parse_expression(&source).unwrap_err();
        assert!(matches!(err, ExpressionError::TooDeep { .. }));

        let negations = format!("{}true", "!".repeat(20_000));
        assert!(matches!(
            parse_expression(&negations),
            Err(ExpressionError::TooDeep { .. })
        ));
    }

    #[test]
    fn test_long_operator_chain_rejected() {
        let source = vec!["1"; 20_000].join(" + ");
        assert!(matches!(
            parse_expression(&source),
            Err(ExpressionError::TooDeep { .. })
        ));

        let source = format!("this{}", ".next".repeat(20_000));
        assert!(matches!(
            parse_expression(&source),
            Err(ExpressionError::TooDeep { .. })
        ));
    }

    #[test]
    fn test_moderate_nesting_accepted() {
        let source = format!("{}1{} + 2", "(".repeat(20), ")".repeat(20));
        assert!(parse_expression(&source).is_ok());
        assert!(parse_expression("!!!!this.accessible").is_ok());
    }
}
