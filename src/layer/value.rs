//! Типизированные значения атрибутов и типы полей схемы.

use std::fmt;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

/// Объявленный тип поля схемы слоя.
///
/// `Other` описывает тип хоста, для которого нет кодировки в архиве
/// (например, списки строк или бинарные поля). Слой с таким полем
/// сохранить нельзя.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FieldType {
    Integer,
    Real,
    Text,
    Boolean,
    Date,
    Time,
    DateTime,
    Other(String),
}

/// Значение атрибута объекта.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Boolean(bool),
    Date(NaiveDate),
    Time(NaiveTime),
    DateTime(NaiveDateTime),
}

impl FieldType {
    pub fn name(&self) -> &str {
        match self {
            Self::Integer => "Integer",
            Self::Real => "Real",
            Self::Text => "Text",
            Self::Boolean => "Boolean",
            Self::Date => "Date",
            Self::Time => "Time",
            Self::DateTime => "DateTime",
            Self::Other(name) => name,
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Тип значения; у `Null` типа нет.
    pub fn field_type(&self) -> Option<FieldType> {
        let ty = match self {
            Self::Null => return None,
            Self::Integer(_) => FieldType::Integer,
            Self::Real(_) => FieldType::Real,
            Self::Text(_) => FieldType::Text,
            Self::Boolean(_) => FieldType::Boolean,
            Self::Date(_) => FieldType::Date,
            Self::Time(_) => FieldType::Time,
            Self::DateTime(_) => FieldType::DateTime,
        };
        Some(ty)
    }

    /// `Null` подходит любому полю, остальные значения подходят только полю своего
    /// типа.
    pub fn conforms_to(
        &self,
        declared: &FieldType,
    ) -> bool {
        match self.field_type() {
            None => true,
            Some(ty) => &ty == declared,
        }
    }

    /// Имя типа значения для сообщений об ошибках.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "Null",
            Self::Integer(_) => "Integer",
            Self::Real(_) => "Real",
            Self::Text(_) => "Text",
            Self::Boolean(_) => "Boolean",
            Self::Date(_) => "Date",
            Self::Time(_) => "Time",
            Self::DateTime(_) => "DateTime",
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Integer(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Real(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Boolean(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl From<NaiveDate> for Value {
    fn from(v: NaiveDate) -> Self {
        Self::Date(v)
    }
}

impl From<NaiveTime> for Value {
    fn from(v: NaiveTime) -> Self {
        Self::Time(v)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(v: NaiveDateTime) -> Self {
        Self::DateTime(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_conforms_to_any_type() {
        assert!(Value::Null.conforms_to(&FieldType::Integer));
        assert!(Value::Null.conforms_to(&FieldType::Other("Blob".into())));
    }

    #[test]
    fn test_no_implicit_widening() {
        assert!(Value::Integer(1).conforms_to(&FieldType::Integer));
        assert!(!Value::Integer(1).conforms_to(&FieldType::Real));
        assert!(!Value::Text("1".into()).conforms_to(&FieldType::Integer));
    }

    #[test]
    fn test_from_option() {
        assert_eq!(Value::from(None::<i64>), Value::Null);
        assert_eq!(Value::from(Some("a")), Value::Text("a".into()));
    }
}
