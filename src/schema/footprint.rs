//! Footprint chunk: placement areas with a trailing key list.
//!
//! ```text
//! version u32
//! keys offset u32, keys length u32      (relative to the end of this pair)
//! areas: u8 count, Area...
//! slots: u8 count, Area...
//! v >= 7: max_height f32, min_height f32
//!   v >= 8: elevation_offset f32
//! keys: u8 count, (instance u64, type u32, group u32)...
//! ```
//!
//! Area:
//!
//! ```text
//! name_hash u32, priority i8, type_flags u32, shape AreaShape,
//! bounds (min_x, min_z, max_x, max_z) f32, v >= 7: surface_flags u32
//! ```

use tracing::trace;

use crate::core::{
    unlocked_fields, update, Codec, CountMode, CountWidth, DependentList, Editable, Element,
    ElementContext, Schema, TgiList, TgiOrder, VersionGate,
};
use crate::stream::{Cursor, RangeHeader, RangePointer};
use crate::util::{Error, Result};
use crate::variant::{AreaShape, Rect};

/// Oldest supported footprint version.
pub const FOOTPRINT_MIN_VERSION: u32 = 6;
/// Adds height limits and area surface flags.
pub const FOOTPRINT_HEIGHTS_VERSION: u32 = 7;
/// Adds the elevation offset.
pub const FOOTPRINT_ELEVATION_VERSION: u32 = 8;
/// Version written by default.
pub const FOOTPRINT_VERSION: u32 = FOOTPRINT_ELEVATION_VERSION;

const MAX_HEIGHT: VersionGate = VersionGate::new("max_height", FOOTPRINT_HEIGHTS_VERSION);
const MIN_HEIGHT: VersionGate = VersionGate::new("min_height", FOOTPRINT_HEIGHTS_VERSION);
const ELEVATION_OFFSET: VersionGate =
    VersionGate::new("elevation_offset", FOOTPRINT_ELEVATION_VERSION);
const SURFACE_FLAGS: VersionGate = VersionGate::new("surface_flags", FOOTPRINT_HEIGHTS_VERSION);

pub(crate) const FOOTPRINT_GATES: [VersionGate; 3] = [MAX_HEIGHT, MIN_HEIGHT, ELEVATION_OFFSET];
pub(crate) const AREA_GATES: [VersionGate; 1] = [SURFACE_FLAGS];

/// One placement or slot area.
#[derive(Debug, PartialEq)]
pub struct Area {
    ctx: ElementContext,
    name_hash: u32,
    priority: i8,
    type_flags: u32,
    shape: AreaShape,
    bounds: Rect,
    surface_flags: u32,
}

impl Area {
    #[inline]
    pub fn version(&self) -> u32 {
        self.ctx.version()
    }

    #[inline]
    pub fn name_hash(&self) -> u32 {
        self.name_hash
    }

    pub fn set_name_hash(&mut self, value: u32) {
        update(&mut self.name_hash, value, self.ctx.handler());
    }

    #[inline]
    pub fn priority(&self) -> i8 {
        self.priority
    }

    pub fn set_priority(&mut self, value: i8) {
        update(&mut self.priority, value, self.ctx.handler());
    }

    #[inline]
    pub fn type_flags(&self) -> u32 {
        self.type_flags
    }

    pub fn set_type_flags(&mut self, value: u32) {
        update(&mut self.type_flags, value, self.ctx.handler());
    }

    #[inline]
    pub fn shape(&self) -> &AreaShape {
        &self.shape
    }

    /// Mutable shape for editing polygon points in place.
    #[inline]
    pub fn shape_mut(&mut self) -> &mut AreaShape {
        &mut self.shape
    }

    /// Replace the shape with a copy bound to this area's owner.
    pub fn set_shape(&mut self, shape: &AreaShape) {
        if self.shape != *shape {
            self.shape = shape.rebind(&self.ctx);
            self.ctx.notify();
        }
    }

    #[inline]
    pub fn bounds(&self) -> Rect {
        self.bounds
    }

    pub fn set_bounds(&mut self, value: Rect) {
        update(&mut self.bounds, value, self.ctx.handler());
    }

    pub fn surface_flags(&self) -> Result<u32> {
        SURFACE_FLAGS.check(self.version())?;
        Ok(self.surface_flags)
    }

    pub fn set_surface_flags(&mut self, value: u32) -> Result<()> {
        SURFACE_FLAGS.check(self.version())?;
        update(&mut self.surface_flags, value, self.ctx.handler());
        Ok(())
    }
}

impl Element for Area {
    fn fresh(ctx: &ElementContext) -> Self {
        Self {
            ctx: ctx.clone(),
            name_hash: 0,
            priority: 0,
            type_flags: 0,
            shape: AreaShape::polygon(ctx),
            bounds: Rect::default(),
            surface_flags: 0,
        }
    }

    fn rebind(&self, ctx: &ElementContext) -> Self {
        Self {
            ctx: ctx.clone(),
            name_hash: self.name_hash,
            priority: self.priority,
            type_flags: self.type_flags,
            shape: self.shape.rebind(ctx),
            bounds: self.bounds,
            surface_flags: self.surface_flags,
        }
    }

    fn field_names(&self) -> Vec<&'static str> {
        unlocked_fields(
            self.version(),
            &["name_hash", "priority", "type_flags", "shape", "bounds"],
            &AREA_GATES,
        )
    }

    fn set_inherited_version(&mut self, version: u32) {
        self.ctx.set_version(version);
    }
}

impl Editable for Area {}

impl Codec for Area {
    fn read(ctx: &ElementContext, cursor: &mut Cursor) -> Result<Self> {
        let name_hash = cursor.read_u32()?;
        let priority = cursor.read_i8()?;
        let type_flags = cursor.read_u32()?;
        let shape = AreaShape::read(ctx, cursor)?;
        let bounds = Rect::read(cursor)?;
        let surface_flags = if SURFACE_FLAGS.is_open(ctx.version()) {
            cursor.read_u32()?
        } else {
            0
        };
        trace!(name_hash, shape = shape.discriminant(), "decoded footprint area");
        Ok(Self {
            ctx: ctx.clone(),
            name_hash,
            priority,
            type_flags,
            shape,
            bounds,
            surface_flags,
        })
    }

    fn write(&self, cursor: &mut Cursor) -> Result<()> {
        cursor.write_u32(self.name_hash)?;
        cursor.write_i8(self.priority)?;
        cursor.write_u32(self.type_flags)?;
        self.shape.write(cursor)?;
        self.bounds.write(cursor)?;
        if SURFACE_FLAGS.is_open(self.version()) {
            cursor.write_u32(self.surface_flags)?;
        }
        Ok(())
    }
}

/// Footprint resource.
#[derive(Debug, PartialEq)]
pub struct Footprint {
    ctx: ElementContext,
    areas: DependentList<Area>,
    slots: DependentList<Area>,
    max_height: f32,
    min_height: f32,
    elevation_offset: f32,
    keys: TgiList,
}

fn area_list(ctx: &ElementContext) -> DependentList<Area> {
    DependentList::new(ctx, CountMode::Inline(CountWidth::U8))
}

impl Footprint {
    #[inline]
    pub fn areas(&self) -> &DependentList<Area> {
        &self.areas
    }

    #[inline]
    pub fn areas_mut(&mut self) -> &mut DependentList<Area> {
        &mut self.areas
    }

    #[inline]
    pub fn slots(&self) -> &DependentList<Area> {
        &self.slots
    }

    #[inline]
    pub fn slots_mut(&mut self) -> &mut DependentList<Area> {
        &mut self.slots
    }

    #[inline]
    pub fn keys(&self) -> &TgiList {
        &self.keys
    }

    #[inline]
    pub fn keys_mut(&mut self) -> &mut TgiList {
        &mut self.keys
    }

    /// Change the format version. Gated fields appear or disappear from both
    /// the wire layout and the accessor surface; areas follow the new version.
    pub fn set_version(&mut self, version: u32) -> Result<()> {
        if version < FOOTPRINT_MIN_VERSION {
            return Err(Error::invalid_state(format!(
                "footprint version {:#x} is below the minimum {:#x}",
                version, FOOTPRINT_MIN_VERSION
            )));
        }
        if version == self.version() {
            return Ok(());
        }
        self.ctx.set_version(version);
        self.areas.set_version(version);
        self.slots.set_version(version);
        self.ctx.notify();
        Ok(())
    }

    pub fn max_height(&self) -> Result<f32> {
        MAX_HEIGHT.check(self.version())?;
        Ok(self.max_height)
    }

    pub fn set_max_height(&mut self, value: f32) -> Result<()> {
        MAX_HEIGHT.check(self.version())?;
        update(&mut self.max_height, value, self.ctx.handler());
        Ok(())
    }

    pub fn min_height(&self) -> Result<f32> {
        MIN_HEIGHT.check(self.version())?;
        Ok(self.min_height)
    }

    pub fn set_min_height(&mut self, value: f32) -> Result<()> {
        MIN_HEIGHT.check(self.version())?;
        update(&mut self.min_height, value, self.ctx.handler());
        Ok(())
    }

    pub fn elevation_offset(&self) -> Result<f32> {
        ELEVATION_OFFSET.check(self.version())?;
        Ok(self.elevation_offset)
    }

    pub fn set_elevation_offset(&mut self, value: f32) -> Result<()> {
        ELEVATION_OFFSET.check(self.version())?;
        update(&mut self.elevation_offset, value, self.ctx.handler());
        Ok(())
    }
}

impl Element for Footprint {
    fn fresh(ctx: &ElementContext) -> Self {
        Self {
            ctx: ctx.clone(),
            areas: area_list(ctx),
            slots: area_list(ctx),
            max_height: 0.0,
            min_height: 0.0,
            elevation_offset: 0.0,
            keys: TgiList::new(ctx, CountWidth::U8, TgiOrder::Itg),
        }
    }

    fn rebind(&self, ctx: &ElementContext) -> Self {
        let ctx = ctx.with_version(self.version());
        Self {
            areas: self.areas.rebind(&ctx),
            slots: self.slots.rebind(&ctx),
            max_height: self.max_height,
            min_height: self.min_height,
            elevation_offset: self.elevation_offset,
            keys: self.keys.rebind(&ctx),
            ctx,
        }
    }

    fn field_names(&self) -> Vec<&'static str> {
        unlocked_fields(
            self.version(),
            &["version", "areas", "slots", "keys"],
            &FOOTPRINT_GATES,
        )
    }
}

impl Codec for Footprint {
    fn read(ctx: &ElementContext, cursor: &mut Cursor) -> Result<Self> {
        let pos = cursor.position();
        let version = cursor.read_u32()?;
        if version < FOOTPRINT_MIN_VERSION {
            return Err(Error::format(
                pos,
                format!("unsupported footprint version {:#x}", version),
            ));
        }
        let ctx = ctx.with_version(version);
        let keys_ptr = RangePointer::read(cursor)?;

        let mut areas = area_list(&ctx);
        areas.decode(cursor)?;
        let mut slots = area_list(&ctx);
        slots.decode(cursor)?;

        let (mut max_height, mut min_height, mut elevation_offset) = (0.0, 0.0, 0.0);
        if MAX_HEIGHT.is_open(version) {
            max_height = cursor.read_f32()?;
            min_height = cursor.read_f32()?;
            if ELEVATION_OFFSET.is_open(version) {
                elevation_offset = cursor.read_f32()?;
            }
        }

        let mut keys = TgiList::new(&ctx, CountWidth::U8, TgiOrder::Itg);
        keys.decode_at(cursor, &keys_ptr)?;

        Ok(Self {
            ctx,
            areas,
            slots,
            max_height,
            min_height,
            elevation_offset,
            keys,
        })
    }

    fn write(&self, cursor: &mut Cursor) -> Result<()> {
        cursor.write_u32(self.version())?;
        let keys_header = RangeHeader::reserve(cursor)?;
        self.areas.encode(cursor)?;
        self.slots.encode(cursor)?;
        if MAX_HEIGHT.is_open(self.version()) {
            cursor.write_f32(self.max_height)?;
            cursor.write_f32(self.min_height)?;
            if ELEVATION_OFFSET.is_open(self.version()) {
                cursor.write_f32(self.elevation_offset)?;
            }
        }
        self.keys.encode_trailing(cursor, keys_header)
    }
}

impl Schema for Footprint {
    const NAME: &'static str = "Footprint";
    const MIN_VERSION: u32 = FOOTPRINT_MIN_VERSION;
    const DEFAULT_VERSION: u32 = FOOTPRINT_VERSION;

    fn version(&self) -> u32 {
        self.ctx.version()
    }
}
