use serde_json::{Map, Value};

use crate::error::{AppError, AppResult};

/// A stored record as it travels between the store and the handlers:
/// `id` plus one JSON entry per column, keyed by the API field name.
pub type Record = Map<String, Value>;

/// Kind
///
/// Storage kind of a column. Text columns carry their maximum length in
/// characters; boolean columns carry the value used when the field is omitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    Text { max: usize },
    Integer,
    Boolean { default: bool },
}

/// How a text column is compared when checking unique groups.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaseRule {
    Sensitive,
    Insensitive,
}

/// Column
///
/// One column of a cadastro table. `name` is the SQL column, `field` the JSON
/// field exposed by the API.
#[derive(Debug, Clone, Copy)]
pub struct Column {
    pub name: &'static str,
    pub field: &'static str,
    pub kind: Kind,
    pub required: bool,
    pub case: CaseRule,
    /// Normalise stored text to upper case (business codes, UF).
    pub upper: bool,
    /// SQL name of the table an integer column points at.
    pub references: Option<&'static str>,
}

impl Column {
    pub const fn text(name: &'static str, field: &'static str, max: usize) -> Self {
        Self {
            name,
            field,
            kind: Kind::Text { max },
            required: false,
            case: CaseRule::Sensitive,
            upper: false,
            references: None,
        }
    }

    pub const fn integer(name: &'static str, field: &'static str) -> Self {
        Self {
            name,
            field,
            kind: Kind::Integer,
            required: false,
            case: CaseRule::Sensitive,
            upper: false,
            references: None,
        }
    }

    pub const fn boolean(name: &'static str, field: &'static str, default: bool) -> Self {
        Self {
            name,
            field,
            kind: Kind::Boolean { default },
            required: false,
            case: CaseRule::Sensitive,
            upper: false,
            references: None,
        }
    }

    pub const fn required(self) -> Self {
        Self { required: true, ..self }
    }

    pub const fn ignore_case(self) -> Self {
        Self { case: CaseRule::Insensitive, ..self }
    }

    pub const fn upper(self) -> Self {
        Self { upper: true, ..self }
    }

    pub const fn references(self, table: &'static str) -> Self {
        Self { references: Some(table), ..self }
    }
}

/// Table
///
/// Declarative description of a cadastro entity. Handlers and both store
/// implementations are driven entirely by this descriptor, so adding an
/// entity never touches SQL or validation code.
#[derive(Debug)]
pub struct Table {
    /// URL segment under `/api/cadastros` and `/api/parametros`.
    pub resource: &'static str,
    /// SQL table name.
    pub name: &'static str,
    /// Human label used in "in use" messages.
    pub label: &'static str,
    pub columns: &'static [Column],
    /// Unique groups by field name. A group matches when all its fields are
    /// equal; any matching group is a conflict.
    pub unique: &'static [&'static [&'static str]],
    pub conflict: &'static str,
    /// Fields searched by the `busca` filter.
    pub search: &'static [&'static str],
    /// Field usable as a foreign-key filter on list endpoints.
    pub parent: Option<&'static str>,
    pub sort: &'static str,
}

impl Table {
    pub fn column(&'static self, field: &str) -> Option<&'static Column> {
        self.columns.iter().find(|c| c.field == field)
    }

    /// The SQL column backing `field`, with `id` always resolvable.
    pub fn sql_name(&'static self, field: &str) -> Option<&'static str> {
        if field == "id" {
            return Some("id");
        }
        self.column(field).map(|c| c.name)
    }
}

/// A validated, typed value for one column.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    Integer(i64),
    Boolean(bool),
    Null,
}

impl FieldValue {
    pub fn to_json(&self) -> Value {
        match self {
            Self::Text(s) => Value::String(s.clone()),
            Self::Integer(i) => Value::from(*i),
            Self::Boolean(b) => Value::Bool(*b),
            Self::Null => Value::Null,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

/// Values
///
/// The full, validated column set for one insert or replace-in-place update,
/// in the table's column order.
#[derive(Debug, Clone)]
pub struct Values {
    entries: Vec<(&'static Column, FieldValue)>,
}

impl Values {
    pub fn iter(&self) -> impl Iterator<Item = &(&'static Column, FieldValue)> {
        self.entries.iter()
    }

    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.entries
            .iter()
            .find(|(c, _)| c.field == field)
            .map(|(_, v)| v)
    }

    /// Builds the record the store hands back after a write.
    pub fn to_record(&self, id: i64) -> Record {
        let mut record = Record::new();
        record.insert("id".to_string(), Value::from(id));
        for (column, value) in &self.entries {
            record.insert(column.field.to_string(), value.to_json());
        }
        record
    }
}

/// Filters accepted by list endpoints.
#[derive(Debug, Clone, Default)]
pub struct ListFilter {
    pub search: Option<String>,
    pub parent: Option<i64>,
    pub limit: Option<usize>,
}

/// validate
///
/// Checks a JSON body against `table` and returns every column's value.
/// Fields not described by the table (including `id`) are ignored; text is
/// trimmed and blank text counts as missing.
pub fn validate(table: &'static Table, body: &Value) -> AppResult<Values> {
    let object = body.as_object().ok_or_else(|| {
        AppError::Validation("Corpo da requisição deve ser um objeto JSON".to_string())
    })?;

    let mut entries = Vec::with_capacity(table.columns.len());
    for column in table.columns {
        let raw = object.get(column.field).unwrap_or(&Value::Null);
        let value = match column.kind {
            Kind::Text { max } => text_value(column, raw, max)?,
            Kind::Integer => integer_value(column, raw)?,
            Kind::Boolean { default } => boolean_value(column, raw, default)?,
        };
        entries.push((column, value));
    }

    Ok(Values { entries })
}

fn missing(column: &Column) -> AppResult<FieldValue> {
    if column.required {
        Err(AppError::Validation(format!(
            "Campo '{}' é obrigatório",
            column.field
        )))
    } else {
        Ok(FieldValue::Null)
    }
}

fn text_value(column: &Column, raw: &Value, max: usize) -> AppResult<FieldValue> {
    let text = match raw {
        Value::Null => return missing(column),
        Value::String(s) => s.trim(),
        _ => {
            return Err(AppError::Validation(format!(
                "Campo '{}' deve ser um texto",
                column.field
            )));
        }
    };

    if text.is_empty() {
        return missing(column);
    }
    // Upper-casing can lengthen text ("ß" becomes "SS"), so measure the stored form.
    let text = if column.upper {
        text.to_uppercase()
    } else {
        text.to_string()
    };
    if text.chars().count() > max {
        return Err(AppError::Validation(format!(
            "Campo '{}' deve ter no máximo {} caracteres",
            column.field, max
        )));
    }

    Ok(FieldValue::Text(text))
}

fn integer_value(column: &Column, raw: &Value) -> AppResult<FieldValue> {
    let invalid = || {
        AppError::Validation(format!(
            "Campo '{}' deve ser um número inteiro",
            column.field
        ))
    };

    match raw {
        Value::Null => missing(column),
        Value::Number(n) => n.as_i64().map(FieldValue::Integer).ok_or_else(invalid),
        Value::String(s) if s.trim().is_empty() => missing(column),
        Value::String(s) => s
            .trim()
            .parse::<i64>()
            .map(FieldValue::Integer)
            .map_err(|_| invalid()),
        _ => Err(invalid()),
    }
}

fn boolean_value(column: &Column, raw: &Value, default: bool) -> AppResult<FieldValue> {
    match raw {
        Value::Null => Ok(FieldValue::Boolean(default)),
        Value::Bool(b) => Ok(FieldValue::Boolean(*b)),
        _ => Err(AppError::Validation(format!(
            "Campo '{}' deve ser verdadeiro ou falso",
            column.field
        ))),
    }
}
