use std::{any::Any, fmt};

use crate::{ErrorExt, StatusCode};

/// Тип значения или геометрии живого слоя, для которого нет кодировки.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnsupportedTypeError {
    pub type_name: String,
    pub field: Option<String>,
    pub layer: Option<String>,
}

impl UnsupportedTypeError {
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            field: None,
            layer: None,
        }
    }

    pub fn with_field(
        mut self,
        field: impl Into<String>,
    ) -> Self {
        self.field = Some(field.into());
        self
    }

    pub fn with_layer(
        mut self,
        layer: impl Into<String>,
    ) -> Self {
        self.layer = Some(layer.into());
        self
    }
}

impl fmt::Display for UnsupportedTypeError {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(f, "unsupported type '{}'", self.type_name)?;
        if let Some(field) = &self.field {
            write!(f, " in field '{field}'")?;
        }
        if let Some(layer) = &self.layer {
            write!(f, " of layer {layer}")?;
        }
        Ok(())
    }
}

impl std::error::Error for UnsupportedTypeError {}

impl ErrorExt for UnsupportedTypeError {
    fn status_code(&self) -> StatusCode {
        StatusCode::UnsupportedType
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
