mod ddl;
mod expr;
mod query;

use crate::ast::{ActionKind, CreateStatement, InsertInto, Statement};
use crate::error::ParseError;
use crate::keywords::{self as kw, is_reserved};
use crate::tokenizer::{Token, Tokenizer};
use tracing::trace;

pub struct Parser<'a> {
    tokens: Tokenizer<'a>,
}

impl<'a> Parser<'a> {
    pub fn new(sql: &'a str) -> Self {
        Self {
            tokens: Tokenizer::new(sql),
        }
    }

    /// Parses statements until the input is exhausted.
    pub fn parse_statements(&mut self) -> Result<Vec<Statement>, ParseError> {
        let mut statements = Vec::new();
        while !self.tokens.is_eof() {
            if self.parse_keyword(kw::SEMICOLON) {
                continue;
            }
            let stmt = self.parse_statement()?;
            trace!(name = %stmt.name(), "parsed statement");
            statements.push(stmt);
        }
        Ok(statements)
    }

    pub fn parse_statement(&mut self) -> Result<Statement, ParseError> {
        let action = self.expect_one_of(&[
            kw::CREATE_OR_REPLACE,
            kw::CREATE,
            kw::REPLACE,
            kw::INSERT_INTO,
        ])?;

        let action = match action {
            kw::INSERT_INTO => return self.parse_insert_into(),
            kw::CREATE_OR_REPLACE => ActionKind::CreateOrReplace,
            kw::REPLACE => ActionKind::Replace,
            _ => ActionKind::Create,
        };

        match self.expect_one_of(&[kw::TABLE, kw::STREAM])? {
            kw::TABLE => {
                let create = self.parse_create(action, |p| p.parse_table_select())?;
                Ok(Statement::CreateTable(create))
            }
            _ => {
                let create = self.parse_create(action, |p| p.parse_stream_select())?;
                Ok(Statement::CreateStream(create))
            }
        }
    }

    /// Everything after `CREATE ... STREAM|TABLE`.
    fn parse_create<Q>(
        &mut self,
        action: ActionKind,
        parse_query: impl FnOnce(&mut Self) -> Result<Q, ParseError>,
    ) -> Result<CreateStatement<Q>, ParseError> {
        let name = self.parse_identifier("[name]")?;

        let columns = if self.parse_keyword(kw::LPAREN) {
            self.parse_column_defs()?
        } else {
            Vec::new()
        };

        let with = if self.parse_keyword(kw::WITH) {
            self.expect_keyword(kw::LPAREN)?;
            Some(self.parse_with_properties()?)
        } else {
            None
        };

        let query = if self.parse_keyword(kw::AS) {
            Some(parse_query(self)?)
        } else if columns.is_empty() {
            // without columns the object needs a SELECT body
            let expected: &[&str] = if with.is_some() {
                &[kw::AS]
            } else {
                &[kw::LPAREN, kw::WITH, kw::AS]
            };
            return Err(self.tokens.expected_one_of(expected));
        } else {
            None
        };

        let emit_changes = self.parse_keyword(kw::EMIT_CHANGES);
        self.expect_end_of_statement()?;

        Ok(CreateStatement {
            action,
            name,
            columns,
            with,
            query,
            emit_changes,
        })
    }

    fn parse_insert_into(&mut self) -> Result<Statement, ParseError> {
        let target = self.parse_identifier("[name]")?;
        let query = self.parse_stream_select()?;
        let emit_changes = self.parse_keyword(kw::EMIT_CHANGES);
        self.expect_end_of_statement()?;
        Ok(Statement::InsertInto(InsertInto {
            target,
            query,
            emit_changes,
        }))
    }

    /// A statement ends at `;` or, for the last one, at end of input.
    fn expect_end_of_statement(&mut self) -> Result<(), ParseError> {
        if self.parse_keyword(kw::SEMICOLON) || self.tokens.is_eof() {
            Ok(())
        } else {
            Err(self.tokens.expected_one_of(&[kw::SEMICOLON]))
        }
    }

    pub fn expect_eof(&mut self) -> Result<(), ParseError> {
        if self.tokens.is_eof() {
            Ok(())
        } else {
            Err(self.tokens.error("end of input"))
        }
    }

    fn parse_keyword(&mut self, keyword: &'static str) -> bool {
        self.tokens.pop_if(&[keyword]).is_some()
    }

    fn expect_keyword(&mut self, keyword: &'static str) -> Result<(), ParseError> {
        self.tokens.pop_keyword(&[keyword]).map(|_| ())
    }

    fn expect_one_of(&mut self, keywords: &[&'static str]) -> Result<&'static str, ParseError> {
        self.tokens.pop_keyword(keywords)
    }

    fn peek_one_of(&self, keywords: &[&'static str]) -> Option<&'static str> {
        self.tokens.peek(keywords).keyword()
    }

    /// A bare word that is not a reserved keyword and contains at least one
    /// letter or underscore.
    fn parse_identifier(&mut self, expected: &str) -> Result<String, ParseError> {
        match self.tokens.peek(&[]).token {
            Token::Word(w) if is_identifier(w) => {
                self.tokens.advance(w.len());
                Ok(w.to_string())
            }
            _ => Err(self.tokens.error(expected)),
        }
    }

    fn parse_number(&mut self) -> Result<u64, ParseError> {
        match self.tokens.peek(&[]).token {
            Token::Word(w) => match w.parse::<u64>() {
                Ok(n) => {
                    self.tokens.advance(w.len());
                    Ok(n)
                }
                Err(_) => Err(self.tokens.error("NUMBER")),
            },
            _ => Err(self.tokens.error("NUMBER")),
        }
    }
}

fn is_identifier(word: &str) -> bool {
    !word.is_empty()
        && !is_reserved(word)
        && word.bytes().any(|b| b.is_ascii_alphabetic() || b == b'_')
}
