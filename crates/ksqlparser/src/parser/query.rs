use super::{is_identifier, Parser};
use crate::ast::{
    AliasedIdent, Conditions, Expr, Join, StreamSelect, TableSelect, TimeUnit, Window, WindowDuration,
    WindowKind,
};
use crate::error::ParseError;
use crate::keywords as kw;
use crate::tokenizer::Token;

/// Words that may follow a source name, so they are never taken as its alias.
const SOURCE_FOLLOWERS: &[&str] = &[
    kw::AS,
    kw::LEFT_JOIN,
    kw::ON,
    kw::WHERE,
    kw::WINDOW,
    kw::GROUP_BY,
    kw::HAVING,
    kw::PARTITION_BY,
    kw::EMIT_CHANGES,
    kw::SEMICOLON,
];

impl Parser<'_> {
    pub(super) fn parse_stream_select(&mut self) -> Result<StreamSelect, ParseError> {
        let (projection, from) = self.parse_projection()?;

        let mut joins = Vec::new();
        while self.parse_keyword(kw::LEFT_JOIN) {
            let source = self.parse_aliased_ident()?;
            self.expect_keyword(kw::ON)?;
            let on = self.parse_conditions()?;
            joins.push(Join { source, on });
        }

        let selection = self.parse_where()?;

        let partition_by = if self.parse_keyword(kw::PARTITION_BY) {
            Some(self.parse_identifier("[column name]")?)
        } else {
            None
        };

        Ok(StreamSelect {
            projection,
            from,
            joins,
            selection,
            partition_by,
        })
    }

    pub(super) fn parse_table_select(&mut self) -> Result<TableSelect, ParseError> {
        let (projection, from) = self.parse_projection()?;

        let window = if self.parse_keyword(kw::WINDOW) {
            Some(self.parse_window()?)
        } else {
            None
        };

        let selection = self.parse_where()?;

        let group_by = if self.parse_keyword(kw::GROUP_BY) {
            self.parse_expr_list(&[kw::HAVING, kw::EMIT_CHANGES, kw::SEMICOLON])?
        } else {
            Vec::new()
        };

        let having = if self.parse_keyword(kw::HAVING) {
            self.parse_conditions()?
        } else {
            Conditions::default()
        };

        Ok(TableSelect {
            projection,
            from,
            window,
            selection,
            group_by,
            having,
        })
    }

    /// `SELECT <exprs> FROM <source>`
    fn parse_projection(&mut self) -> Result<(Vec<Expr>, AliasedIdent), ParseError> {
        self.expect_keyword(kw::SELECT)?;
        let projection = self.parse_expr_list(&[kw::FROM])?;
        self.expect_keyword(kw::FROM)?;
        let from = self.parse_aliased_ident()?;
        Ok((projection, from))
    }

    fn parse_where(&mut self) -> Result<Conditions, ParseError> {
        if self.parse_keyword(kw::WHERE) {
            self.parse_conditions()
        } else {
            Ok(Conditions::default())
        }
    }

    fn parse_aliased_ident(&mut self) -> Result<AliasedIdent, ParseError> {
        let name = self.parse_identifier("[source name]")?;
        let alias = match self.tokens.peek(SOURCE_FOLLOWERS).token {
            Token::Keyword(kw::AS) => {
                self.expect_keyword(kw::AS)?;
                Some(self.parse_identifier("alias")?)
            }
            Token::Word(w) if is_identifier(w) => Some(self.parse_identifier("alias")?),
            _ => None,
        };
        Ok(AliasedIdent { name, alias })
    }

    /// `KIND ([SIZE] n UNIT[, ADVANCE BY n UNIT][, RETENTION n UNIT][, GRACE PERIOD n UNIT])`
    fn parse_window(&mut self) -> Result<Window, ParseError> {
        let kind = self.expect_one_of(kw::WINDOW_KINDS)?;
        let kind = WindowKind::from_keyword(kind).ok_or_else(|| self.tokens.error("window kind"))?;
        self.expect_keyword(kw::LPAREN)?;
        self.parse_keyword(kw::SIZE);
        let size = self.parse_duration()?;

        let mut window = Window {
            kind,
            size,
            advance_by: None,
            retention: None,
            grace_period: None,
        };
        while self.expect_one_of(&[kw::COMMA, kw::RPAREN])? == kw::COMMA {
            let field = self.expect_one_of(kw::WINDOW_FIELDS)?;
            let duration = Some(self.parse_duration()?);
            match field {
                kw::ADVANCE_BY => window.advance_by = duration,
                kw::RETENTION => window.retention = duration,
                _ => window.grace_period = duration,
            }
        }
        Ok(window)
    }

    fn parse_duration(&mut self) -> Result<WindowDuration, ParseError> {
        let amount = self.parse_number()?;
        let unit = self.expect_one_of(kw::TIME_UNITS)?;
        let unit = TimeUnit::from_keyword(unit).ok_or_else(|| self.tokens.error("time unit"))?;
        Ok(WindowDuration { amount, unit })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stream_select_with_join_and_partition() {
        let select = Parser::new(
            "SELECT a.id, b.name AS n FROM a LEFT JOIN b ON a.id = b.id WHERE a.x > 1 PARTITION BY a.id",
        )
        .parse_stream_select()
        .unwrap();
        assert_eq!(select.sources(), vec!["a", "b"]);
        assert_eq!(select.projection[1], Expr::literal("b.name").aliased("n"));
        assert_eq!(select.selection.0.len(), 1);
        assert_eq!(select.partition_by.as_deref(), Some("a.id"));
    }

    #[test]
    fn source_alias_does_not_swallow_clauses() {
        let select = Parser::new("SELECT * FROM s EMIT CHANGES")
            .parse_stream_select()
            .unwrap();
        assert_eq!(select.from, AliasedIdent::new("s"));

        let select = Parser::new("SELECT x.a FROM s x WHERE x.a = 1")
            .parse_stream_select()
            .unwrap();
        assert_eq!(select.from.alias.as_deref(), Some("x"));
    }

    #[test]
    fn hopping_window_fields_in_any_order() {
        let select = Parser::new(
            "SELECT k, COUNT(*) c FROM s WINDOW HOPPING (SIZE 1 minute, GRACE PERIOD 0 SECONDS, ADVANCE BY 30 SECONDS) GROUP BY k",
        )
        .parse_table_select()
        .unwrap();
        let window = select.window.unwrap();
        assert_eq!(window.kind, WindowKind::Hopping);
        assert_eq!(window.size.unit, TimeUnit::Minutes);
        assert_eq!(window.advance_by.unwrap().amount, 30);
        assert_eq!(window.grace_period.unwrap().amount, 0);
        assert!(window.retention.is_none());
        assert_eq!(select.group_by, vec![Expr::literal("k")]);
    }

    #[test]
    fn session_window_without_size() {
        let select = Parser::new(
            "SELECT k FROM s WINDOW SESSION (20 MINUTES, RETENTION 30 MINUTES) WHERE k != 'null' GROUP BY k HAVING COUNT(k) = 1",
        )
        .parse_table_select()
        .unwrap();
        let window = select.window.as_ref().unwrap();
        assert_eq!(window.kind, WindowKind::Session);
        assert_eq!(window.size.amount, 20);
        assert_eq!(select.having.0.len(), 1);
        assert_eq!(
            select.to_string(),
            "SELECT\n  k\nFROM s\nWINDOW SESSION (20 MINUTES, RETENTION 30 MINUTES)\nWHERE k != 'null'\nGROUP BY k\nHAVING COUNT(k) = 1"
        );
    }

    #[test]
    fn bad_window_unit() {
        let err = Parser::new("SELECT k FROM s WINDOW TUMBLING (SIZE 5 WEEKS)")
            .parse_table_select()
            .unwrap_err();
        assert!(err.expected.contains("MINUTES"));
    }
}
