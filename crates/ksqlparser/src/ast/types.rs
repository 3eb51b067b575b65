use super::write_separated;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DataType {
    Boolean,
    Integer,
    Int,
    BigInt,
    Double,
    Varchar,
    String,
    Array(Box<DataType>),
    Map(Box<DataType>, Box<DataType>),
    Struct(Vec<(String, DataType)>),
}

impl DataType {
    /// Maps a scalar type keyword; composite types are built by the parser.
    pub fn scalar(keyword: &str) -> Option<DataType> {
        Some(match keyword {
            "BOOLEAN" => DataType::Boolean,
            "INTEGER" => DataType::Integer,
            "INT" => DataType::Int,
            "BIGINT" => DataType::BigInt,
            "DOUBLE" => DataType::Double,
            "VARCHAR" => DataType::Varchar,
            "STRING" => DataType::String,
            _ => return None,
        })
    }
}

struct StructField<'a>(&'a str, &'a DataType);

impl fmt::Display for StructField<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.0, self.1)
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataType::Boolean => f.write_str("BOOLEAN"),
            DataType::Integer => f.write_str("INTEGER"),
            DataType::Int => f.write_str("INT"),
            DataType::BigInt => f.write_str("BIGINT"),
            DataType::Double => f.write_str("DOUBLE"),
            DataType::Varchar => f.write_str("VARCHAR"),
            DataType::String => f.write_str("STRING"),
            DataType::Array(item) => write!(f, "ARRAY<{item}>"),
            DataType::Map(key, value) => write!(f, "MAP<{key}, {value}>"),
            DataType::Struct(fields) => {
                let fields: Vec<StructField> =
                    fields.iter().map(|(n, t)| StructField(n, t)).collect();
                f.write_str("STRUCT<")?;
                write_separated(f, &fields, ", ")?;
                f.write_str(">")
            }
        }
    }
}
