//! Table definitions.
//!
//! `delivery_key` is unique so a redelivered message maps to the row written
//! the first time.

pub const PEOPLE_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS people (
    id           UUID PRIMARY KEY,
    delivery_key TEXT NOT NULL UNIQUE,
    name         TEXT NOT NULL,
    surname      TEXT NOT NULL,
    patronymic   TEXT,
    age          SMALLINT CHECK (age BETWEEN 0 AND 255),
    gender       TEXT,
    nationality  TEXT,
    enriched_at  TIMESTAMPTZ NOT NULL,
    created_at   TIMESTAMPTZ NOT NULL DEFAULT now()
)
"#;

pub const PEOPLE_NAME_INDEX: &str =
    "CREATE INDEX IF NOT EXISTS people_surname_name_idx ON people (surname, name)";

/// DDL in execution order.
pub fn all_tables() -> Vec<&'static str> {
    vec![PEOPLE_TABLE, PEOPLE_NAME_INDEX]
}
