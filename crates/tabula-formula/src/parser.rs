use crate::ast::{Ast, BinaryOp, ParseError, UnaryOp, POSTFIX_PRECEDENCE, UNARY_PRECEDENCE};
use crate::tokenizer::{tokenize, Token, TokenKind};

/// Parse formula text (with or without the leading `=`).
pub fn parse(formula: &str) -> Result<Ast, ParseError> {
    let tokens: Vec<Token> = tokenize(formula)
        .into_iter()
        .filter(|t| t.kind != TokenKind::Space)
        .collect();
    let mut parser = Parser { tokens, pos: 0 };
    if parser.peek_operator("=") {
        parser.pos += 1;
    }
    if parser.at_end() {
        return Err(ParseError::new("empty formula", 0));
    }
    let ast = parser.expression(0)?;
    if !parser.at_end() {
        return Err(ParseError::new(
            format!("unexpected token '{}'", parser.tokens[parser.pos].value),
            parser.pos,
        ));
    }
    Ok(ast)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn peek_kind(&self) -> Option<TokenKind> {
        self.peek().map(|t| t.kind)
    }

    fn peek_operator(&self, op: &str) -> bool {
        self.peek()
            .is_some_and(|t| t.kind == TokenKind::Operator && t.value == op)
    }

    fn next(&mut self) -> Result<Token, ParseError> {
        let token = self
            .tokens
            .get(self.pos)
            .cloned()
            .ok_or_else(|| ParseError::new("unexpected end of formula", self.pos))?;
        self.pos += 1;
        Ok(token)
    }

    fn expression(&mut self, min_precedence: u8) -> Result<Ast, ParseError> {
        let mut left = self.prefix()?;
        loop {
            if self.peek_operator("%") {
                if POSTFIX_PRECEDENCE < min_precedence {
                    break;
                }
                self.pos += 1;
                left = Ast::Percent(Box::new(left));
                continue;
            }
            let Some(op) = self
                .peek()
                .filter(|t| t.kind == TokenKind::Operator)
                .and_then(|t| BinaryOp::from_operator(&t.value))
            else {
                break;
            };
            let precedence = op.precedence();
            if precedence <= min_precedence {
                break;
            }
            self.pos += 1;
            let right = self.expression(precedence)?;
            left = Ast::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn prefix(&mut self) -> Result<Ast, ParseError> {
        let position = self.pos;
        let token = self.next()?;
        match token.kind {
            TokenKind::Number => Ok(Ast::Number(token.value)),
            TokenKind::String => Ok(Ast::String(unquote(&token.value))),
            TokenKind::Error => Ok(Ast::Error(token.value)),
            TokenKind::Reference => Ok(Ast::Reference(token.value)),
            TokenKind::TableReference => Ok(Ast::TableReference(token.value)),
            TokenKind::Symbol => {
                if self.peek_kind() == Some(TokenKind::LeftParen) {
                    self.pos += 1;
                    let args = self.arguments()?;
                    return Ok(Ast::FunctionCall {
                        name: token.value,
                        args,
                    });
                }
                if token.value.eq_ignore_ascii_case("TRUE") {
                    Ok(Ast::Boolean(true))
                } else if token.value.eq_ignore_ascii_case("FALSE") {
                    Ok(Ast::Boolean(false))
                } else {
                    Ok(Ast::Symbol(token.value))
                }
            }
            TokenKind::LeftParen => {
                let inner = self.expression(0)?;
                match self.next() {
                    Ok(t) if t.kind == TokenKind::RightParen => Ok(inner),
                    _ => Err(ParseError::new("missing closing parenthesis", self.pos)),
                }
            }
            TokenKind::Operator if token.value == "-" || token.value == "+" => {
                let op = if token.value == "-" {
                    UnaryOp::Minus
                } else {
                    UnaryOp::Plus
                };
                let operand = self.expression(UNARY_PRECEDENCE)?;
                Ok(Ast::Unary {
                    op,
                    operand: Box::new(operand),
                })
            }
            _ => Err(ParseError::new(
                format!("unexpected token '{}'", token.value),
                position,
            )),
        }
    }

    /// Arguments after the opening parenthesis, up to and including the closing one.
    fn arguments(&mut self) -> Result<Vec<Ast>, ParseError> {
        let mut args = Vec::new();
        if self.peek_kind() == Some(TokenKind::RightParen) {
            self.pos += 1;
            return Ok(args);
        }
        loop {
            match self.peek_kind() {
                Some(TokenKind::ArgSeparator) | Some(TokenKind::RightParen) => args.push(Ast::Empty),
                Some(_) => args.push(self.expression(0)?),
                None => return Err(ParseError::new("missing closing parenthesis", self.pos)),
            }
            match self.next() {
                Ok(t) if t.kind == TokenKind::ArgSeparator => continue,
                Ok(t) if t.kind == TokenKind::RightParen => return Ok(args),
                Ok(t) => {
                    return Err(ParseError::new(
                        format!("unexpected token '{}' in argument list", t.value),
                        self.pos - 1,
                    ))
                }
                Err(_) => return Err(ParseError::new("missing closing parenthesis", self.pos)),
            }
        }
    }
}

fn unquote(literal: &str) -> String {
    let inner = literal
        .strip_prefix('"')
        .map(|s| s.strip_suffix('"').unwrap_or(s))
        .unwrap_or(literal);
    inner.replace("\"\"", "\"")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::ast_to_formula;
    use pretty_assertions::assert_eq;

    fn roundtrip(formula: &str) -> String {
        ast_to_formula(&parse(formula).unwrap())
    }

    #[test]
    fn precedence_and_associativity() {
        assert_eq!(roundtrip("=1+2*3"), "1+2*3");
        assert_eq!(roundtrip("=(1+2)*3"), "(1+2)*3");
        assert_eq!(roundtrip("=1-2-3"), "1-2-3");
        assert_eq!(roundtrip("=1-(2-3)"), "1-(2-3)");
        assert_eq!(roundtrip("=-A1^2"), "-A1^2");
        assert_eq!(roundtrip("=A1&\"x\"=B1"), "A1&\"x\"=B1");
        assert_eq!(roundtrip("=50%*2"), "50%*2");
    }

    #[test]
    fn function_calls_and_empty_arguments() {
        let ast = parse("=IF(A1, , 2)").unwrap();
        let Ast::FunctionCall { name, args } = ast else {
            panic!("expected a function call");
        };
        assert_eq!(name, "IF");
        assert_eq!(args.len(), 3);
        assert_eq!(args[1], Ast::Empty);
        assert_eq!(roundtrip("=sum( A1:B2 , Sheet2!C3 )"), "sum(A1:B2,Sheet2!C3)");
        assert_eq!(roundtrip("=NOW()"), "NOW()");
    }

    #[test]
    fn booleans_and_literals() {
        assert_eq!(parse("=true").unwrap(), Ast::Boolean(true));
        assert_eq!(parse("=\"a\"\"b\"").unwrap(), Ast::String("a\"b".into()));
        assert_eq!(parse("=#N/A").unwrap(), Ast::Error("#N/A".into()));
    }

    #[test]
    fn reports_errors() {
        assert!(parse("=").is_err());
        assert!(parse("=SUM(1,2").is_err());
        assert!(parse("=1+").is_err());
        assert!(parse("=(1").is_err());
        assert!(parse("=1 2").is_err());
    }
}
