// Declarative record validation
// Every model is built from a JSON mapping in one pass that collects all field errors before failing

use serde_json::{Map, Value};
use std::fmt;
use thiserror::Error;

// Error kinds reported per field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldErrorKind {
    Missing,
    NotString,
    NotInteger,
    NotBool,
    NotObject,
    Negative,
}

impl FieldErrorKind {
    pub fn message(&self) -> &'static str {
        match self {
            FieldErrorKind::Missing => "field required",
            FieldErrorKind::NotString => "str type expected",
            FieldErrorKind::NotInteger => "value is not a valid integer",
            FieldErrorKind::NotBool => "value could not be parsed to a boolean",
            FieldErrorKind::NotObject => "value is not a valid dict",
            FieldErrorKind::Negative => "ensure this value is greater than or equal to 0",
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            FieldErrorKind::Missing => "value_error.missing",
            FieldErrorKind::NotString => "type_error.str",
            FieldErrorKind::NotInteger => "type_error.integer",
            FieldErrorKind::NotBool => "type_error.bool",
            FieldErrorKind::NotObject => "type_error.dict",
            FieldErrorKind::Negative => "value_error.number.not_ge",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    // Dotted path, e.g. "bookingdates.checkin"
    pub field: String,
    pub kind: FieldErrorKind,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub model: &'static str,
    pub errors: Vec<FieldError>,
}

impl ValidationError {
    pub fn fields(&self) -> Vec<&str> {
        self.errors.iter().map(|e| e.field.as_str()).collect()
    }

    pub fn missing_fields(&self) -> Vec<&str> {
        self.errors
            .iter()
            .filter(|e| e.kind == FieldErrorKind::Missing)
            .map(|e| e.field.as_str())
            .collect()
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let plural = if self.errors.len() == 1 { "" } else { "s" };
        write!(
            f,
            "{} validation error{} for {}",
            self.errors.len(),
            plural,
            self.model
        )?;
        for error in &self.errors {
            write!(
                f,
                "\n{}\n  {} (type={})",
                error.field,
                error.kind.message(),
                error.kind.code()
            )?;
        }
        Ok(())
    }
}

// A record that can be constructed from an untyped JSON value
pub trait Schema: Sized {
    const NAME: &'static str;

    // Read every field through the reader; missing values are reported there, not here
    fn read(reader: &mut FieldReader<'_>) -> Option<Self>;

    fn validate(value: &Value) -> Result<Self, ValidationError> {
        let mut errors = Vec::new();
        let parsed = match value.as_object() {
            Some(fields) => {
                let mut reader = FieldReader::new(fields, "", &mut errors);
                Self::read(&mut reader)
            }
            None => {
                errors.push(FieldError {
                    field: "__root__".to_string(),
                    kind: FieldErrorKind::NotObject,
                });
                None
            }
        };

        match parsed {
            Some(record) if errors.is_empty() => Ok(record),
            _ => Err(ValidationError {
                model: Self::NAME,
                errors,
            }),
        }
    }

    fn validate_str(body: &str) -> Result<Self, ValidationError> {
        let value: Value = serde_json::from_str(body).map_err(|_| ValidationError {
            model: Self::NAME,
            errors: vec![FieldError {
                field: "__root__".to_string(),
                kind: FieldErrorKind::NotObject,
            }],
        })?;
        Self::validate(&value)
    }
}

// Walks one JSON object, accumulating errors into a shared list
pub struct FieldReader<'a> {
    fields: &'a Map<String, Value>,
    prefix: String,
    errors: &'a mut Vec<FieldError>,
}

impl<'a> FieldReader<'a> {
    fn new(fields: &'a Map<String, Value>, prefix: &str, errors: &'a mut Vec<FieldError>) -> Self {
        Self {
            fields,
            prefix: prefix.to_string(),
            errors,
        }
    }

    fn path(&self, name: &str) -> String {
        if self.prefix.is_empty() {
            name.to_string()
        } else {
            format!("{}.{}", self.prefix, name)
        }
    }

    fn fail(&mut self, name: &str, kind: FieldErrorKind) {
        let field = self.path(name);
        self.errors.push(FieldError { field, kind });
    }

    fn present(&mut self, name: &str) -> Option<&'a Value> {
        let fields = self.fields;
        match fields.get(name) {
            None | Some(Value::Null) => {
                self.fail(name, FieldErrorKind::Missing);
                None
            }
            Some(value) => Some(value),
        }
    }

    pub fn string(&mut self, name: &str) -> Option<String> {
        match self.present(name)? {
            Value::String(s) => Some(s.clone()),
            _ => {
                self.fail(name, FieldErrorKind::NotString);
                None
            }
        }
    }

    // Strict string: an empty value counts as not supplied
    pub fn non_empty_string(&mut self, name: &str) -> Option<String> {
        match self.present(name)? {
            Value::String(s) if s.is_empty() => {
                self.fail(name, FieldErrorKind::Missing);
                None
            }
            Value::String(s) => Some(s.clone()),
            _ => {
                self.fail(name, FieldErrorKind::NotString);
                None
            }
        }
    }

    pub fn optional_string(&mut self, name: &str) -> Option<Option<String>> {
        let fields = self.fields;
        match fields.get(name) {
            None | Some(Value::Null) => Some(None),
            Some(Value::String(s)) => Some(Some(s.clone())),
            Some(_) => {
                self.fail(name, FieldErrorKind::NotString);
                None
            }
        }
    }

    pub fn integer(&mut self, name: &str) -> Option<i64> {
        match self.present(name)?.as_i64() {
            Some(n) => Some(n),
            None => {
                self.fail(name, FieldErrorKind::NotInteger);
                None
            }
        }
    }

    pub fn non_negative(&mut self, name: &str) -> Option<u64> {
        let n = self.integer(name)?;
        if n < 0 {
            self.fail(name, FieldErrorKind::Negative);
            return None;
        }
        Some(n as u64)
    }

    pub fn boolean(&mut self, name: &str) -> Option<bool> {
        match self.present(name)? {
            Value::Bool(b) => Some(*b),
            _ => {
                self.fail(name, FieldErrorKind::NotBool);
                None
            }
        }
    }

    pub fn nested<T: Schema>(&mut self, name: &str) -> Option<T> {
        let value = self.present(name)?;
        match value.as_object() {
            Some(fields) => {
                let prefix = self.path(name);
                let mut reader = FieldReader::new(fields, &prefix, &mut *self.errors);
                T::read(&mut reader)
            }
            None => {
                self.fail(name, FieldErrorKind::NotObject);
                None
            }
        }
    }
}
