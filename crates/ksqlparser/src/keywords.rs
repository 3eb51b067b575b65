//! Reserved words, grouped by the grammar position they are looked for in.
//!
//! Multi-word entries match with any whitespace between their words.

use once_cell::sync::Lazy;

pub const CREATE: &str = "CREATE";
pub const CREATE_OR_REPLACE: &str = "CREATE OR REPLACE";
pub const REPLACE: &str = "REPLACE";
pub const INSERT_INTO: &str = "INSERT INTO";
pub const STREAM: &str = "STREAM";
pub const TABLE: &str = "TABLE";
pub const SELECT: &str = "SELECT";
pub const FROM: &str = "FROM";
pub const WITH: &str = "WITH";
pub const WHERE: &str = "WHERE";
pub const AS: &str = "AS";
pub const PARTITION_BY: &str = "PARTITION BY";
pub const GROUP_BY: &str = "GROUP BY";
pub const HAVING: &str = "HAVING";
pub const WINDOW: &str = "WINDOW";
pub const LEFT_JOIN: &str = "LEFT JOIN";
pub const ON: &str = "ON";
pub const EMIT_CHANGES: &str = "EMIT CHANGES";
pub const AND: &str = "AND";
pub const OR: &str = "OR";
pub const CASE_WHEN: &str = "CASE WHEN";
pub const THEN: &str = "THEN";
pub const ELSE: &str = "ELSE";
pub const END: &str = "END";
pub const PRIMARY_KEY: &str = "PRIMARY KEY";
pub const KEY: &str = "KEY";
pub const CAST: &str = "CAST";

pub const SEMICOLON: &str = ";";
pub const COMMA: &str = ",";
pub const LPAREN: &str = "(";
pub const RPAREN: &str = ")";
pub const LBRACKET: &str = "[";
pub const RBRACKET: &str = "]";
pub const LT: &str = "<";
pub const GT: &str = ">";
pub const EQ: &str = "=";

pub const PLUS: &str = "+";
pub const MINUS: &str = "-";
pub const MULTIPLY: &str = "*";
pub const DIVIDE: &str = "/";

pub const ARITHMETIC: &[&str] = &[PLUS, MINUS, MULTIPLY, DIVIDE];

pub const COMPARISON: &[&str] = &[">=", "<=", "!=", "<>", "=", ">", "<", "IS NOT", "IS", "LIKE"];

pub const WINDOW_KINDS: &[&str] = &["TUMBLING", "HOPPING", "SESSION"];
pub const SIZE: &str = "SIZE";
pub const ADVANCE_BY: &str = "ADVANCE BY";
pub const RETENTION: &str = "RETENTION";
pub const GRACE_PERIOD: &str = "GRACE PERIOD";
pub const WINDOW_FIELDS: &[&str] = &[ADVANCE_BY, RETENTION, GRACE_PERIOD];
pub const TIME_UNITS: &[&str] = &[
    "MILLISECONDS",
    "MILLISECOND",
    "SECONDS",
    "SECOND",
    "MINUTES",
    "MINUTE",
    "HOURS",
    "HOUR",
    "DAYS",
    "DAY",
];

pub const DATA_TYPES: &[&str] = &[
    "BOOLEAN", "INTEGER", "INT", "BIGINT", "DOUBLE", "VARCHAR", "STRING", "ARRAY", "MAP",
    "STRUCT",
];

pub const KAFKA_TOPIC: &str = "KAFKA_TOPIC";
pub const VALUE_FORMAT: &str = "VALUE_FORMAT";
pub const TIMESTAMP: &str = "TIMESTAMP";
pub const PARTITIONS: &str = "PARTITIONS";
pub const REPLICAS: &str = "REPLICAS";
pub const WITH_PROPERTIES: &[&str] = &[KAFKA_TOPIC, VALUE_FORMAT, KEY, TIMESTAMP, PARTITIONS, REPLICAS];
pub const VALUE_FORMATS: &[&str] = &["'AVRO'", "'JSON'", "'DELIMITED'", "'PROTOBUF'", "'KAFKA'"];

/// Words that can never be used as an identifier.
pub const RESERVED: &[&str] = &[
    SELECT,
    INSERT_INTO,
    CREATE,
    CREATE_OR_REPLACE,
    REPLACE,
    STREAM,
    TABLE,
    WITH,
    WHERE,
    FROM,
    AS,
    PARTITION_BY,
    GROUP_BY,
    HAVING,
    WINDOW,
    LEFT_JOIN,
];

/// Built-in functions and the minimum number of arguments each one takes.
/// Names outside this table are accepted with any number of arguments.
pub const FUNCTIONS: &[(&str, usize)] = &[
    ("ABS", 1),
    ("ARRAYCONTAINS", 2),
    ("CEIL", 1),
    ("CONCAT", 2),
    ("EXTRACTJSONFIELD", 2),
    ("FLOOR", 1),
    ("IFNULL", 2),
    ("LCASE", 1),
    ("LEN", 1),
    ("RANDOM", 0),
    ("ROUND", 1),
    ("STRINGTOTIMESTAMP", 2),
    ("SUBSTRING", 2),
    ("TIMESTAMPTOSTRING", 2),
    ("TRIM", 1),
    ("UCASE", 1),
    ("COUNT_DISTINCT", 1),
    ("COUNT", 1),
    ("MAX", 1),
    ("MIN", 1),
    ("SUM", 1),
    ("TOPKDISTINCT", 2),
    ("TOPK", 2),
    ("EXPLODE", 1),
    ("AS_MAP", 2),
    ("AS_VALUE", 1),
    ("LATEST_BY_OFFSET", 1),
    ("EARLIEST_BY_OFFSET", 1),
    ("COLLECT_LIST", 1),
    ("SPLIT", 2),
    (CAST, 1),
];

/// Candidates looked for at the start of an expression.
pub static EXPRESSION_HEADS: Lazy<Vec<&'static str>> = Lazy::new(|| {
    let mut heads: Vec<&'static str> = FUNCTIONS.iter().map(|(name, _)| *name).collect();
    heads.push(CASE_WHEN);
    heads
});

pub fn function_arity(name: &str) -> Option<usize> {
    FUNCTIONS
        .iter()
        .find(|(f, _)| f.eq_ignore_ascii_case(name))
        .map(|(_, arity)| *arity)
}

pub fn is_reserved(word: &str) -> bool {
    RESERVED.iter().any(|r| r.eq_ignore_ascii_case(word))
}
