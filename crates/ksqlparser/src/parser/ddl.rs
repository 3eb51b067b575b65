use super::Parser;
use crate::ast::{ColumnDef, ColumnKey, DataType, ValueFormat, WithProperties};
use crate::error::ParseError;
use crate::keywords as kw;
use crate::tokenizer::Token;

impl Parser<'_> {
    /// Column list of a CREATE, read after its opening `(`.
    pub(super) fn parse_column_defs(&mut self) -> Result<Vec<ColumnDef>, ParseError> {
        let mut columns = Vec::new();
        loop {
            let name = self.parse_identifier("[column name]")?;
            let data_type = self.parse_data_type()?;
            let key = match self.tokens.pop_if(&[kw::PRIMARY_KEY, kw::KEY]) {
                Some(kw::PRIMARY_KEY) => Some(ColumnKey::PrimaryKey),
                Some(_) => Some(ColumnKey::Key),
                None => None,
            };
            columns.push(ColumnDef {
                name,
                data_type,
                key,
            });

            if self.expect_one_of(&[kw::COMMA, kw::RPAREN])? == kw::RPAREN {
                return Ok(columns);
            }
        }
    }

    pub(super) fn parse_data_type(&mut self) -> Result<DataType, ParseError> {
        let keyword = self.expect_one_of(kw::DATA_TYPES)?;
        if let Some(scalar) = DataType::scalar(keyword) {
            return Ok(scalar);
        }

        self.expect_keyword(kw::LT)?;
        let data_type = match keyword {
            "ARRAY" => DataType::Array(Box::new(self.parse_data_type()?)),
            "MAP" => {
                let key = self.parse_data_type()?;
                self.expect_keyword(kw::COMMA)?;
                let value = self.parse_data_type()?;
                DataType::Map(Box::new(key), Box::new(value))
            }
            _ => {
                let mut fields = Vec::new();
                loop {
                    let field = self.parse_identifier("[field name]")?;
                    fields.push((field, self.parse_data_type()?));
                    if !self.parse_keyword(kw::COMMA) {
                        break;
                    }
                }
                DataType::Struct(fields)
            }
        };
        self.expect_keyword(kw::GT)?;
        Ok(data_type)
    }

    /// `WITH` property list, read after its opening `(`.
    pub(super) fn parse_with_properties(&mut self) -> Result<WithProperties, ParseError> {
        let mut props = WithProperties::default();
        loop {
            let prop = self.expect_one_of(kw::WITH_PROPERTIES)?;
            self.expect_keyword(kw::EQ)?;
            match prop {
                kw::KAFKA_TOPIC => props.kafka_topic = Some(self.parse_quoted()?),
                kw::KEY => props.key = Some(self.parse_quoted()?),
                kw::TIMESTAMP => props.timestamp = Some(self.parse_quoted()?),
                kw::VALUE_FORMAT => {
                    let format = self.expect_one_of(kw::VALUE_FORMATS)?;
                    props.value_format = ValueFormat::from_keyword(format);
                }
                kw::PARTITIONS => props.partitions = Some(self.parse_count()?),
                _ => props.replicas = Some(self.parse_count()?),
            }

            if self.expect_one_of(&[kw::COMMA, kw::RPAREN])? == kw::RPAREN {
                return Ok(props);
            }
        }
    }

    fn parse_quoted(&mut self) -> Result<String, ParseError> {
        match self.tokens.peek(&[]).token {
            Token::Quoted(q) => {
                self.tokens.advance(q.len());
                Ok(q.to_string())
            }
            _ => Err(self.tokens.error("quoted string")),
        }
    }

    fn parse_count(&mut self) -> Result<u32, ParseError> {
        let n = self.parse_number()?;
        u32::try_from(n).map_err(|_| self.tokens.error("NUMBER"))
    }
}
