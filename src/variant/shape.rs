//! Area shapes: single-byte discriminant, every value a real shape.

use glam::Vec2;

use super::{read_tag, unknown_discriminant};
use crate::core::{
    update, BitEq, Codec, CountMode, CountWidth, DependentList, Editable, Element, ElementContext,
};
use crate::stream::Cursor;
use crate::util::{Error, Result};

const TAG_POLYGON: u8 = 1;
const TAG_CIRCLE: u8 = 2;
const TAG_RECT: u8 = 3;

/// Axis-aligned rectangle on the ground plane (x, z).
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Rect {
    pub min: Vec2,
    pub max: Vec2,
}

impl Rect {
    pub const fn new(min: Vec2, max: Vec2) -> Self {
        Self { min, max }
    }

    /// Build from `[min_x, min_z, max_x, max_z]`.
    pub fn from_slice(values: &[f32]) -> Result<Self> {
        match values {
            [min_x, min_z, max_x, max_z] => Ok(Self::new(
                Vec2::new(*min_x, *min_z),
                Vec2::new(*max_x, *max_z),
            )),
            _ => Err(Error::FixedLength {
                what: "Rect",
                expected: 4,
                actual: values.len(),
            }),
        }
    }

    pub fn to_array(&self) -> [f32; 4] {
        [self.min.x, self.min.y, self.max.x, self.max.y]
    }

    pub fn read(cursor: &mut Cursor) -> Result<Self> {
        let min = read_vec2(cursor)?;
        let max = read_vec2(cursor)?;
        Ok(Self::new(min, max))
    }

    pub fn write(&self, cursor: &mut Cursor) -> Result<()> {
        write_vec2(cursor, self.min)?;
        write_vec2(cursor, self.max)
    }
}

impl BitEq for Rect {
    fn bit_eq(&self, other: &Self) -> bool {
        self.min.bit_eq(&other.min) && self.max.bit_eq(&other.max)
    }
}

pub(crate) fn read_vec2(cursor: &mut Cursor) -> Result<Vec2> {
    let x = cursor.read_f32()?;
    let y = cursor.read_f32()?;
    Ok(Vec2::new(x, y))
}

pub(crate) fn write_vec2(cursor: &mut Cursor, v: Vec2) -> Result<()> {
    cursor.write_f32(v.x)?;
    cursor.write_f32(v.y)
}

/// One polygon vertex.
#[derive(Debug, PartialEq)]
pub struct PolygonPoint {
    ctx: ElementContext,
    point: Vec2,
}

impl PolygonPoint {
    #[inline]
    pub fn point(&self) -> Vec2 {
        self.point
    }

    #[inline]
    pub fn x(&self) -> f32 {
        self.point.x
    }

    #[inline]
    pub fn z(&self) -> f32 {
        self.point.y
    }

    pub fn set_point(&mut self, point: Vec2) {
        update(&mut self.point, point, self.ctx.handler());
    }

    pub fn set_x(&mut self, x: f32) {
        self.set_point(Vec2::new(x, self.point.y));
    }

    pub fn set_z(&mut self, z: f32) {
        self.set_point(Vec2::new(self.point.x, z));
    }
}

impl Element for PolygonPoint {
    fn fresh(ctx: &ElementContext) -> Self {
        Self {
            ctx: ctx.clone(),
            point: Vec2::ZERO,
        }
    }

    fn rebind(&self, ctx: &ElementContext) -> Self {
        Self {
            ctx: ctx.clone(),
            point: self.point,
        }
    }

    fn field_names(&self) -> Vec<&'static str> {
        vec!["x", "z"]
    }
}

impl Editable for PolygonPoint {}

impl Codec for PolygonPoint {
    fn read(ctx: &ElementContext, cursor: &mut Cursor) -> Result<Self> {
        Ok(Self {
            ctx: ctx.clone(),
            point: read_vec2(cursor)?,
        })
    }

    fn write(&self, cursor: &mut Cursor) -> Result<()> {
        write_vec2(cursor, self.point)
    }
}

/// Footprint area outline.
#[derive(Debug, PartialEq)]
pub enum AreaShape {
    /// Closed polygon, at most 255 vertices.
    Polygon(DependentList<PolygonPoint>),
    Circle { center: Vec2, radius: f32 },
    Rect(Rect),
}

impl AreaShape {
    /// Empty polygon bound to `ctx`.
    pub fn polygon(ctx: &ElementContext) -> Self {
        Self::Polygon(DependentList::new(ctx, CountMode::Inline(CountWidth::U8)))
    }

    /// Polygon with the given vertices.
    pub fn polygon_from(ctx: &ElementContext, points: &[Vec2]) -> Result<Self> {
        let mut list: DependentList<PolygonPoint> =
            DependentList::new(ctx, CountMode::Inline(CountWidth::U8));
        for p in points {
            list.add_default()?.set_point(*p);
        }
        Ok(Self::Polygon(list))
    }

    /// Wire discriminant.
    pub fn discriminant(&self) -> u8 {
        match self {
            Self::Polygon(_) => TAG_POLYGON,
            Self::Circle { .. } => TAG_CIRCLE,
            Self::Rect(_) => TAG_RECT,
        }
    }

    /// Polygon vertices, if this is a polygon.
    pub fn points(&self) -> Option<&DependentList<PolygonPoint>> {
        match self {
            Self::Polygon(points) => Some(points),
            _ => None,
        }
    }

    pub fn points_mut(&mut self) -> Option<&mut DependentList<PolygonPoint>> {
        match self {
            Self::Polygon(points) => Some(points),
            _ => None,
        }
    }
}

impl Element for AreaShape {
    fn fresh(ctx: &ElementContext) -> Self {
        Self::polygon(ctx)
    }

    fn rebind(&self, ctx: &ElementContext) -> Self {
        match self {
            Self::Polygon(points) => Self::Polygon(points.rebind(ctx)),
            Self::Circle { center, radius } => Self::Circle {
                center: *center,
                radius: *radius,
            },
            Self::Rect(rect) => Self::Rect(*rect),
        }
    }

    fn field_names(&self) -> Vec<&'static str> {
        match self {
            Self::Polygon(_) => vec!["points"],
            Self::Circle { .. } => vec!["center", "radius"],
            Self::Rect(_) => vec!["bounds"],
        }
    }
}

impl Codec for AreaShape {
    fn read(ctx: &ElementContext, cursor: &mut Cursor) -> Result<Self> {
        let (tag, position) = read_tag(cursor)?;
        match tag {
            TAG_POLYGON => {
                let mut points = DependentList::new(ctx, CountMode::Inline(CountWidth::U8));
                points.decode(cursor)?;
                Ok(Self::Polygon(points))
            }
            TAG_CIRCLE => {
                let center = read_vec2(cursor)?;
                let radius = cursor.read_f32()?;
                Ok(Self::Circle { center, radius })
            }
            TAG_RECT => Ok(Self::Rect(Rect::read(cursor)?)),
            other => Err(unknown_discriminant("AreaShape", other as u64, position)),
        }
    }

    fn write(&self, cursor: &mut Cursor) -> Result<()> {
        cursor.write_u8(self.discriminant())?;
        match self {
            Self::Polygon(points) => points.encode(cursor),
            Self::Circle { center, radius } => {
                write_vec2(cursor, *center)?;
                cursor.write_f32(*radius)
            }
            Self::Rect(rect) => rect.write(cursor),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(bytes: Vec<u8>) -> Result<AreaShape> {
        AreaShape::read(&ElementContext::detached(1), &mut Cursor::from_bytes(bytes))
    }

    #[test]
    fn test_every_discriminant() -> Result<()> {
        let shape = decode(vec![1, 0])?;
        assert_eq!(shape.points().map(|p| p.len()), Some(0));

        let mut circle = vec![2u8];
        for v in [1.0f32, 2.0, 0.5] {
            circle.extend_from_slice(&v.to_le_bytes());
        }
        assert_eq!(
            decode(circle)?,
            AreaShape::Circle { center: Vec2::new(1.0, 2.0), radius: 0.5 }
        );

        let mut rect = vec![3u8];
        rect.extend_from_slice(&[0u8; 16]);
        assert_eq!(decode(rect)?, AreaShape::Rect(Rect::default()));
        Ok(())
    }

    #[test]
    fn test_unknown_discriminant() {
        for tag in [0u8, 4, 0xFF] {
            let err = decode(vec![tag, 0, 0, 0]).unwrap_err();
            assert!(matches!(
                err,
                Error::UnknownDiscriminant { family: "AreaShape", position: 0, .. }
            ));
        }
    }

    #[test]
    fn test_polygon_roundtrip() -> Result<()> {
        let ctx = ElementContext::detached(1);
        let shape = AreaShape::polygon_from(
            &ctx,
            &[Vec2::new(0.0, 0.0), Vec2::new(1.0, 0.0), Vec2::new(1.0, 1.0)],
        )?;
        let mut c = Cursor::new();
        shape.write(&mut c)?;
        assert_eq!(c.len(), 2 + 3 * 8);
        c.seek(0)?;
        assert_eq!(AreaShape::read(&ctx, &mut c)?, shape);
        Ok(())
    }

    #[test]
    fn test_rect_fixed_length() {
        assert!(Rect::from_slice(&[0.0, 0.0, 1.0, 1.0]).is_ok());
        let err = Rect::from_slice(&[0.0, 1.0]).unwrap_err();
        assert!(matches!(err, Error::FixedLength { expected: 4, actual: 2, .. }));
    }
}
