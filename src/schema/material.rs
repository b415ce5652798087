//! Shader material chunk.
//!
//! ```text
//! version u32
//! keys offset u32, keys length u32
//! name_hash u32, shader_hash u32
//! v >= 0x103: is_video_surface u32, is_painting u32
//! ShaderFieldBlock (offsets relative to its own start)
//! keys: u32 count, (type u32, group u32, instance u64)...
//! ```

use tracing::trace;

use crate::core::{
    unlocked_fields, update, Codec, CountWidth, Element, ElementContext, Schema, Tgi, TgiList,
    TgiOrder, VersionGate,
};
use crate::stream::{Cursor, RangeHeader, RangePointer};
use crate::util::{Error, Result};
use crate::variant::{ShaderFieldBlock, ShaderValue};

/// Oldest supported material version.
pub const MATERIAL_MIN_VERSION: u32 = 0x100;
/// Adds the surface flags.
pub const MATERIAL_FLAGS_VERSION: u32 = 0x103;
/// Version written by default.
pub const MATERIAL_VERSION: u32 = MATERIAL_FLAGS_VERSION;

const IS_VIDEO_SURFACE: VersionGate = VersionGate::new("is_video_surface", MATERIAL_FLAGS_VERSION);
const IS_PAINTING: VersionGate = VersionGate::new("is_painting", MATERIAL_FLAGS_VERSION);

pub(crate) const MATERIAL_GATES: [VersionGate; 2] = [IS_VIDEO_SURFACE, IS_PAINTING];

/// Shader material resource.
#[derive(Debug, PartialEq)]
pub struct ShaderMaterial {
    ctx: ElementContext,
    name_hash: u32,
    shader_hash: u32,
    is_video_surface: bool,
    is_painting: bool,
    fields: ShaderFieldBlock,
    keys: TgiList,
}

fn read_flag(cursor: &mut Cursor) -> Result<bool> {
    let pos = cursor.position();
    match cursor.read_u32()? {
        0 => Ok(false),
        1 => Ok(true),
        v => Err(Error::format(pos, format!("invalid flag value {:#x}", v))),
    }
}

impl ShaderMaterial {
    #[inline]
    pub fn name_hash(&self) -> u32 {
        self.name_hash
    }

    pub fn set_name_hash(&mut self, value: u32) {
        update(&mut self.name_hash, value, self.ctx.handler());
    }

    #[inline]
    pub fn shader_hash(&self) -> u32 {
        self.shader_hash
    }

    pub fn set_shader_hash(&mut self, value: u32) {
        update(&mut self.shader_hash, value, self.ctx.handler());
    }

    pub fn is_video_surface(&self) -> Result<bool> {
        IS_VIDEO_SURFACE.check(self.version())?;
        Ok(self.is_video_surface)
    }

    pub fn set_video_surface(&mut self, value: bool) -> Result<()> {
        IS_VIDEO_SURFACE.check(self.version())?;
        update(&mut self.is_video_surface, value, self.ctx.handler());
        Ok(())
    }

    pub fn is_painting(&self) -> Result<bool> {
        IS_PAINTING.check(self.version())?;
        Ok(self.is_painting)
    }

    pub fn set_painting(&mut self, value: bool) -> Result<()> {
        IS_PAINTING.check(self.version())?;
        update(&mut self.is_painting, value, self.ctx.handler());
        Ok(())
    }

    /// Change the format version.
    pub fn set_version(&mut self, version: u32) -> Result<()> {
        if version < MATERIAL_MIN_VERSION {
            return Err(Error::invalid_state(format!(
                "material version {:#x} is below the minimum {:#x}",
                version, MATERIAL_MIN_VERSION
            )));
        }
        if version != self.version() {
            self.ctx.set_version(version);
            self.ctx.notify();
        }
        Ok(())
    }

    #[inline]
    pub fn fields(&self) -> &ShaderFieldBlock {
        &self.fields
    }

    #[inline]
    pub fn fields_mut(&mut self) -> &mut ShaderFieldBlock {
        &mut self.fields
    }

    #[inline]
    pub fn keys(&self) -> &TgiList {
        &self.keys
    }

    #[inline]
    pub fn keys_mut(&mut self) -> &mut TgiList {
        &mut self.keys
    }

    /// Texture bound to `field_id`, resolving key-list references.
    pub fn texture(&self, field_id: u32) -> Option<Tgi> {
        match self.fields.get(field_id)? {
            ShaderValue::TextureKey(key) => Some(*key),
            ShaderValue::TextureRef(index) => self.keys.get(*index as usize),
            _ => None,
        }
    }

    /// Bind `field_id` to `key` through the key list, reusing an existing entry.
    ///
    /// Appending a new key and rebinding the field are separate mutations, so
    /// a key not yet in the list notifies twice.
    pub fn set_texture(&mut self, field_id: u32, key: Tgi) -> Result<()> {
        let index = self.keys.index_of_or_insert(key)? as u32;
        let value = ShaderValue::TextureRef(index);
        let existing = self.fields.fields().iter().position(|f| f.field_id() == field_id);
        if let Some(field) = existing.and_then(|i| self.fields.fields_mut().get_mut(i)) {
            return field.set_value(value);
        }
        self.fields.add(field_id, value)
    }
}

impl Element for ShaderMaterial {
    fn fresh(ctx: &ElementContext) -> Self {
        Self {
            ctx: ctx.clone(),
            name_hash: 0,
            shader_hash: 0,
            is_video_surface: false,
            is_painting: false,
            fields: ShaderFieldBlock::new(ctx),
            keys: TgiList::new(ctx, CountWidth::U32, TgiOrder::Tgi),
        }
    }

    fn rebind(&self, ctx: &ElementContext) -> Self {
        let ctx = ctx.with_version(self.version());
        Self {
            name_hash: self.name_hash,
            shader_hash: self.shader_hash,
            is_video_surface: self.is_video_surface,
            is_painting: self.is_painting,
            fields: self.fields.rebind(&ctx),
            keys: self.keys.rebind(&ctx),
            ctx,
        }
    }

    fn field_names(&self) -> Vec<&'static str> {
        unlocked_fields(
            self.version(),
            &["version", "name_hash", "shader_hash", "fields", "keys"],
            &MATERIAL_GATES,
        )
    }
}

impl Codec for ShaderMaterial {
    fn read(ctx: &ElementContext, cursor: &mut Cursor) -> Result<Self> {
        let pos = cursor.position();
        let version = cursor.read_u32()?;
        if version < MATERIAL_MIN_VERSION {
            return Err(Error::format(
                pos,
                format!("unsupported material version {:#x}", version),
            ));
        }
        let ctx = ctx.with_version(version);
        let keys_ptr = RangePointer::read(cursor)?;
        let name_hash = cursor.read_u32()?;
        let shader_hash = cursor.read_u32()?;

        let (mut is_video_surface, mut is_painting) = (false, false);
        if IS_VIDEO_SURFACE.is_open(version) {
            is_video_surface = read_flag(cursor)?;
            is_painting = read_flag(cursor)?;
        }

        let mut fields = ShaderFieldBlock::new(&ctx);
        fields.decode(cursor)?;
        trace!(shader_hash, fields = fields.fields().len(), "decoded material fields");

        let mut keys = TgiList::new(&ctx, CountWidth::U32, TgiOrder::Tgi);
        keys.decode_at(cursor, &keys_ptr)?;

        Ok(Self {
            ctx,
            name_hash,
            shader_hash,
            is_video_surface,
            is_painting,
            fields,
            keys,
        })
    }

    fn write(&self, cursor: &mut Cursor) -> Result<()> {
        cursor.write_u32(self.version())?;
        let keys_header = RangeHeader::reserve(cursor)?;
        cursor.write_u32(self.name_hash)?;
        cursor.write_u32(self.shader_hash)?;
        if IS_VIDEO_SURFACE.is_open(self.version()) {
            cursor.write_u32(self.is_video_surface as u32)?;
            cursor.write_u32(self.is_painting as u32)?;
        }
        self.fields.encode(cursor)?;
        self.keys.encode_trailing(cursor, keys_header)
    }
}

impl Schema for ShaderMaterial {
    const NAME: &'static str = "ShaderMaterial";
    const MIN_VERSION: u32 = MATERIAL_MIN_VERSION;
    const DEFAULT_VERSION: u32 = MATERIAL_VERSION;

    fn version(&self) -> u32 {
        self.ctx.version()
    }
}
