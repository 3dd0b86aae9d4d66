use super::{FieldType, Geometry, Value};

/// Поле схемы: имя и объявленный тип.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Field {
    pub name: String,
    pub field_type: FieldType,
}

impl Field {
    pub fn new(
        name: impl Into<String>,
        field_type: FieldType,
    ) -> Self {
        Self {
            name: name.into(),
            field_type,
        }
    }
}

/// Упорядоченный список полей слоя.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Schema {
    fields: Vec<Field>,
}

impl Schema {
    pub fn new(fields: Vec<Field>) -> Self {
        Self { fields }
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn push(
        &mut self,
        field: Field,
    ) {
        self.fields.push(field);
    }

    /// Индекс поля по имени (первое совпадение).
    pub fn index_of(
        &self,
        name: &str,
    ) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }

    pub fn field(
        &self,
        name: &str,
    ) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Field> {
        self.fields.iter()
    }
}

impl FromIterator<Field> for Schema {
    fn from_iter<I: IntoIterator<Item = Field>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a Schema {
    type Item = &'a Field;
    type IntoIter = std::slice::Iter<'a, Field>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.iter()
    }
}

/// Объект слоя: идентификатор, геометрия и атрибуты в порядке полей схемы.
///
/// Идентификатор уникален внутри слоя на момент записи, но не обязан
/// сохраняться между сессиями.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Feature {
    pub id: i64,
    pub geometry: Geometry,
    pub attributes: Vec<Value>,
}

impl Feature {
    pub fn new(
        id: i64,
        geometry: Geometry,
        attributes: Vec<Value>,
    ) -> Self {
        Self {
            id,
            geometry,
            attributes,
        }
    }

    /// Значение атрибута по имени поля.
    pub fn attribute<'a>(
        &'a self,
        schema: &Schema,
        name: &str,
    ) -> Option<&'a Value> {
        schema.index_of(name).and_then(|i| self.attributes.get(i))
    }
}
