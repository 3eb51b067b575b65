use super::{is_identifier, Parser};
use crate::ast::{ArithmeticOp, ComparisonOp, Condition, Conditions, Conjunction, Expr};
use crate::error::ParseError;
use crate::keywords::{self as kw, function_arity, EXPRESSION_HEADS};
use crate::tokenizer::Token;

impl Parser<'_> {
    /// Comma separated expressions, each optionally aliased with or without
    /// `AS`. Stops in front of any of `terminators` (or end of input) without
    /// consuming it.
    pub(super) fn parse_expr_list(
        &mut self,
        terminators: &[&'static str],
    ) -> Result<Vec<Expr>, ParseError> {
        let mut lookahead: Vec<&'static str> = terminators.to_vec();
        lookahead.extend([kw::COMMA, kw::AS]);

        let mut items = Vec::new();
        loop {
            let mut expr = self.parse_expr()?;

            let next = self.tokens.peek(&lookahead);
            let alias = match next.token {
                Token::Keyword(kw::AS) => {
                    self.tokens.advance(next.raw.len());
                    Some(self.parse_identifier("alias")?)
                }
                Token::Word(w) if is_identifier(w) => Some(self.parse_identifier("alias")?),
                _ => None,
            };
            if let Some(alias) = alias {
                expr = expr.aliased(alias);
            }
            items.push(expr);

            if self.tokens.is_eof() {
                return Ok(items);
            }
            match self.tokens.peek(&lookahead).token {
                Token::Keyword(kw::COMMA) => self.tokens.advance(1),
                Token::Keyword(k) if terminators.contains(&k) => return Ok(items),
                _ => {
                    let mut expected = terminators.to_vec();
                    expected.push(kw::COMMA);
                    return Err(self.tokens.expected_one_of(&expected));
                }
            }
        }
    }

    /// One expression. Arithmetic operators take everything to their right as
    /// the right operand.
    pub(super) fn parse_expr(&mut self) -> Result<Expr, ParseError> {
        let head = self.tokens.peek(&EXPRESSION_HEADS);
        let (name, known_function) = match head.token {
            Token::Keyword(kw::CASE_WHEN) => {
                self.tokens.advance(head.raw.len());
                return self.parse_case_when();
            }
            Token::Keyword(f) => (f.to_string(), true),
            Token::Quoted(q) => (q.to_string(), false),
            Token::Word(w) if !w.is_empty() => (w.to_string(), false),
            _ => return Err(self.tokens.error("expression")),
        };
        self.tokens.advance(head.raw.len());

        let mut expr = if self.parse_keyword(kw::LPAREN) {
            self.parse_function(name)?
        } else if known_function {
            // a function name used as a plain column keeps its spelling
            Expr::Literal(head.raw.to_string())
        } else {
            Expr::Literal(name)
        };

        while self.parse_keyword(kw::LBRACKET) {
            let index = self.parse_expr()?;
            self.expect_keyword(kw::RBRACKET)?;
            expr = Expr::Index {
                expr: Box::new(expr),
                index: Box::new(index),
            };
        }

        if let Some(op) = self.peek_one_of(kw::ARITHMETIC) {
            self.expect_keyword(op)?;
            let right = self.parse_expr()?;
            let op = ArithmeticOp::from_keyword(op).ok_or_else(|| self.tokens.error("operator"))?;
            expr = Expr::BinaryOp {
                left: Box::new(expr),
                op,
                right: Box::new(right),
            };
        }

        Ok(expr)
    }

    /// Arguments of a call whose `(` was already consumed.
    fn parse_function(&mut self, name: String) -> Result<Expr, ParseError> {
        if name.eq_ignore_ascii_case(kw::CAST) {
            let inner = self.parse_expr()?;
            self.expect_keyword(kw::AS)?;
            let data_type = self.parse_data_type()?;
            self.expect_keyword(kw::RPAREN)?;
            return Ok(Expr::Cast {
                expr: Box::new(inner),
                data_type,
            });
        }

        let mut args = Vec::new();
        if !self.parse_keyword(kw::RPAREN) {
            loop {
                args.push(self.parse_expr()?);
                if self.expect_one_of(&[kw::COMMA, kw::RPAREN])? == kw::RPAREN {
                    break;
                }
            }
        }

        if let Some(min) = function_arity(&name) {
            if args.len() < min {
                return Err(self.tokens.error(format!(
                    "at least {min} argument(s) for {name}, found {}",
                    args.len()
                )));
            }
        }

        Ok(Expr::Function { name, args })
    }

    /// `CASE WHEN` was consumed; reads up to and including `END`.
    fn parse_case_when(&mut self) -> Result<Expr, ParseError> {
        let conditions = self.parse_conditions()?;
        self.expect_keyword(kw::THEN)?;
        let then = self.parse_expr()?;
        let otherwise = if self.expect_one_of(&[kw::ELSE, kw::END])? == kw::ELSE {
            let otherwise = self.parse_expr()?;
            self.expect_keyword(kw::END)?;
            Some(Box::new(otherwise))
        } else {
            None
        };
        Ok(Expr::CaseWhen {
            conditions,
            then: Box::new(then),
            otherwise,
        })
    }

    /// `a op b [AND|OR c op d ...]` as a flat list.
    pub(super) fn parse_conditions(&mut self) -> Result<Conditions, ParseError> {
        let mut conditions = Vec::new();
        loop {
            let left = self.parse_expr()?;
            let op = self.expect_one_of(kw::COMPARISON)?;
            let op = ComparisonOp::from_keyword(op).ok_or_else(|| self.tokens.error("operator"))?;
            let right = self.parse_expr()?;
            let conjunction = match self.tokens.pop_if(&[kw::AND, kw::OR]) {
                Some(kw::AND) => Some(Conjunction::And),
                Some(_) => Some(Conjunction::Or),
                None => None,
            };
            conditions.push(Condition {
                left,
                op,
                right,
                conjunction,
            });
            if conjunction.is_none() {
                return Ok(Conditions(conditions));
            }
        }
    }
}
