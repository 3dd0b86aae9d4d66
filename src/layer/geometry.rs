use std::fmt;

use num_enum::{IntoPrimitive, TryFromPrimitive};

/// Двумерная координата (x: долгота/восток, y: широта/север).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coord {
    pub x: f64,
    pub y: f64,
}

impl Coord {
    pub const fn new(
        x: f64,
        y: f64,
    ) -> Self {
        Self { x, y }
    }
}

impl From<(f64, f64)> for Coord {
    fn from((x, y): (f64, f64)) -> Self {
        Self { x, y }
    }
}

/// Замкнутое кольцо полигона. Первое кольцо полигона: внешнее.
pub type Ring = Vec<Coord>;

/// Геометрия объекта слоя.
///
/// `Empty` означает отсутствие геометрии (null) и кодируется отдельным
/// тегом, так что пустой `LineString(vec![])` и `Empty` не смешиваются.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Geometry {
    #[default]
    Empty,
    Point(Coord),
    LineString(Vec<Coord>),
    Polygon(Vec<Ring>),
    MultiPoint(Vec<Coord>),
    MultiLineString(Vec<Vec<Coord>>),
    MultiPolygon(Vec<Vec<Ring>>),
}

/// Тип геометрии слоя. Значения совпадают с тегами геометрии в архиве.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, TryFromPrimitive, IntoPrimitive)]
#[repr(u8)]
pub enum GeometryKind {
    /// Слой без геометрии (только атрибуты).
    NoGeometry = 0x00,
    Point = 0x01,
    LineString = 0x02,
    Polygon = 0x03,
    MultiPoint = 0x04,
    MultiLineString = 0x05,
    MultiPolygon = 0x06,
}

////////////////////////////////////////////////////////////////////////////////
// Собственные методы
////////////////////////////////////////////////////////////////////////////////

impl Geometry {
    pub fn point(
        x: f64,
        y: f64,
    ) -> Self {
        Self::Point(Coord::new(x, y))
    }

    pub fn line<I>(coords: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Coord>,
    {
        Self::LineString(coords.into_iter().map(Into::into).collect())
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    /// Тип геометрии; для `Empty` возвращает `None`.
    pub fn kind(&self) -> Option<GeometryKind> {
        match self {
            Self::Empty => None,
            Self::Point(_) => Some(GeometryKind::Point),
            Self::LineString(_) => Some(GeometryKind::LineString),
            Self::Polygon(_) => Some(GeometryKind::Polygon),
            Self::MultiPoint(_) => Some(GeometryKind::MultiPoint),
            Self::MultiLineString(_) => Some(GeometryKind::MultiLineString),
            Self::MultiPolygon(_) => Some(GeometryKind::MultiPolygon),
        }
    }

    /// Общее число вершин.
    pub fn coord_count(&self) -> usize {
        match self {
            Self::Empty => 0,
            Self::Point(_) => 1,
            Self::LineString(c) | Self::MultiPoint(c) => c.len(),
            Self::Polygon(rings) | Self::MultiLineString(rings) => {
                rings.iter().map(Vec::len).sum()
            }
            Self::MultiPolygon(polys) => polys.iter().flatten().map(Vec::len).sum(),
        }
    }
}

impl GeometryKind {
    /// Может ли слой этого типа хранить геометрию `geometry`.
    ///
    /// Пустая геометрия допустима в любом слое.
    pub fn accepts(
        self,
        geometry: &Geometry,
    ) -> bool {
        match geometry.kind() {
            None => true,
            Some(kind) => self == kind,
        }
    }
}

impl fmt::Display for GeometryKind {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        let name = match self {
            Self::NoGeometry => "NoGeometry",
            Self::Point => "Point",
            Self::LineString => "LineString",
            Self::Polygon => "Polygon",
            Self::MultiPoint => "MultiPoint",
            Self::MultiLineString => "MultiLineString",
            Self::MultiPolygon => "MultiPolygon",
        };
        f.write_str(name)
    }
}
