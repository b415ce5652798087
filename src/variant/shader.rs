//! Shader material fields.
//!
//! The shape of a field's value is chosen jointly by its type code and arity,
//! and for four-float values also by the semantic field id (colour fields
//! decode as [`ShaderValue::Color`]). Headers are grouped at the start of the
//! block and payloads packed after them:
//!
//! ```text
//! anchor
//! | count u32 | data_len u32 | header[0] .. header[n-1] | payload region (data_len bytes) |
//! header = field_id u32, type_code u32, arity u32, offset u32 (relative to anchor)
//! ```

use glam::{Vec2, Vec3, Vec4};

use super::shape::{read_vec2, write_vec2};
use super::unknown_discriminant;
use crate::core::{
    update, BitEq, CountMode, CountWidth, DependentList, Editable, Element, ElementContext, Tgi,
    TgiOrder,
};
use crate::stream::{Cursor, Placeholder};
use crate::util::{Error, Result};

/// Floating point payload.
pub const TYPE_FLOAT: u32 = 1;
/// Integer payload.
pub const TYPE_INT: u32 = 2;
/// Texture reference payload (key or key-list index).
pub const TYPE_TEXTURE: u32 = 4;

/// Encoded size of one field header.
pub const SHADER_HEADER_SIZE: u64 = 16;

pub const FIELD_DIFFUSE_MAP: u32 = 0x6CC0_FD85;
pub const FIELD_NORMAL_MAP: u32 = 0x6E56_548A;
pub const FIELD_DIFFUSE_COLOR: u32 = 0x637D_AA05;
pub const FIELD_SPECULAR_COLOR: u32 = 0x04A5_DAA3;
pub const FIELD_EMISSION_COLOR: u32 = 0xF5A5_27A2;
pub const FIELD_ALPHA: u32 = 0x7C8F_A8B0;
pub const FIELD_UV_SCALES: u32 = 0x1B9D_3AC5;

/// Field ids whose four-float payload is an RGBA colour.
pub const COLOR_FIELDS: &[u32] = &[FIELD_DIFFUSE_COLOR, FIELD_SPECULAR_COLOR, FIELD_EMISSION_COLOR];

/// Check if a field id carries a colour.
pub fn is_color_field(field_id: u32) -> bool {
    COLOR_FIELDS.contains(&field_id)
}

/// Value of one shader field.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ShaderValue {
    Float(f32),
    Float2(Vec2),
    Float3(Vec3),
    Float4(Vec4),
    /// RGBA, only on colour fields.
    Color(Vec4),
    Int(i32),
    /// Inline resource key.
    TextureKey(Tgi),
    /// Index into the material's key list.
    TextureRef(u32),
}

impl ShaderValue {
    /// Type code written in the header.
    pub fn type_code(&self) -> u32 {
        match self {
            Self::Float(_) | Self::Float2(_) | Self::Float3(_) | Self::Float4(_) | Self::Color(_) => {
                TYPE_FLOAT
            }
            Self::Int(_) => TYPE_INT,
            Self::TextureKey(_) | Self::TextureRef(_) => TYPE_TEXTURE,
        }
    }

    /// Arity written in the header.
    pub fn arity(&self) -> u32 {
        match self {
            Self::Float(_) | Self::Int(_) | Self::TextureRef(_) => 1,
            Self::Float2(_) => 2,
            Self::Float3(_) => 3,
            Self::Float4(_) | Self::Color(_) | Self::TextureKey(_) => 4,
        }
    }

    /// Encoded payload size.
    pub fn payload_size(&self) -> u64 {
        4 * self.arity() as u64
    }

    /// Check that this shape is what `field_id` would decode to.
    pub fn fits_field(&self, field_id: u32) -> bool {
        match self {
            Self::Color(_) => is_color_field(field_id),
            Self::Float4(_) => !is_color_field(field_id),
            _ => true,
        }
    }

    /// Decode the payload selected by (type code, arity) and field id.
    pub fn read(
        field_id: u32,
        type_code: u32,
        arity: u32,
        position: u64,
        cursor: &mut Cursor,
    ) -> Result<Self> {
        Ok(match (type_code, arity) {
            (TYPE_FLOAT, 1) => Self::Float(cursor.read_f32()?),
            (TYPE_FLOAT, 2) => Self::Float2(read_vec2(cursor)?),
            (TYPE_FLOAT, 3) => {
                let xy = read_vec2(cursor)?;
                Self::Float3(xy.extend(cursor.read_f32()?))
            }
            (TYPE_FLOAT, 4) => {
                let xy = read_vec2(cursor)?;
                let zw = read_vec2(cursor)?;
                let v = Vec4::new(xy.x, xy.y, zw.x, zw.y);
                if is_color_field(field_id) {
                    Self::Color(v)
                } else {
                    Self::Float4(v)
                }
            }
            (TYPE_INT, 1) => Self::Int(cursor.read_i32()?),
            (TYPE_TEXTURE, 1) => Self::TextureRef(cursor.read_u32()?),
            (TYPE_TEXTURE, 4) => Self::TextureKey(Tgi::read_ordered(cursor, TgiOrder::Itg)?),
            _ => {
                return Err(unknown_discriminant(
                    "ShaderValue",
                    ((type_code as u64) << 32) | arity as u64,
                    position,
                ))
            }
        })
    }

    /// Encode the payload.
    pub fn write(&self, cursor: &mut Cursor) -> Result<()> {
        match self {
            Self::Float(v) => cursor.write_f32(*v),
            Self::Float2(v) => write_vec2(cursor, *v),
            Self::Float3(v) => {
                write_vec2(cursor, v.truncate())?;
                cursor.write_f32(v.z)
            }
            Self::Float4(v) | Self::Color(v) => {
                for c in v.to_array() {
                    cursor.write_f32(c)?;
                }
                Ok(())
            }
            Self::Int(v) => cursor.write_i32(*v),
            Self::TextureRef(v) => cursor.write_u32(*v),
            Self::TextureKey(key) => key.write_ordered(cursor, TgiOrder::Itg),
        }
    }
}

impl BitEq for ShaderValue {
    fn bit_eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Float(a), Self::Float(b)) => a.bit_eq(b),
            (Self::Float2(a), Self::Float2(b)) => a.bit_eq(b),
            (Self::Float3(a), Self::Float3(b)) => a.bit_eq(b),
            (Self::Float4(a), Self::Float4(b)) | (Self::Color(a), Self::Color(b)) => a.bit_eq(b),
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::TextureKey(a), Self::TextureKey(b)) => a == b,
            (Self::TextureRef(a), Self::TextureRef(b)) => a == b,
            _ => false,
        }
    }
}

/// One (field id, value) pair.
#[derive(Debug, PartialEq)]
pub struct ShaderField {
    ctx: ElementContext,
    field_id: u32,
    value: ShaderValue,
}

impl ShaderField {
    /// Detached field; lists rebind it on insertion.
    pub fn new(field_id: u32, value: ShaderValue) -> Result<Self> {
        check_fits(field_id, &value)?;
        Ok(Self {
            ctx: ElementContext::default(),
            field_id,
            value,
        })
    }

    #[inline]
    pub fn field_id(&self) -> u32 {
        self.field_id
    }

    #[inline]
    pub fn value(&self) -> &ShaderValue {
        &self.value
    }

    pub fn set_value(&mut self, value: ShaderValue) -> Result<()> {
        check_fits(self.field_id, &value)?;
        update(&mut self.value, value, self.ctx.handler());
        Ok(())
    }
}

fn check_fits(field_id: u32, value: &ShaderValue) -> Result<()> {
    if value.fits_field(field_id) {
        Ok(())
    } else {
        Err(Error::invalid_state(format!(
            "{:?} cannot be stored on field {:#010x}",
            value, field_id
        )))
    }
}

impl Element for ShaderField {
    fn fresh(ctx: &ElementContext) -> Self {
        Self {
            ctx: ctx.clone(),
            field_id: 0,
            value: ShaderValue::Float(0.0),
        }
    }

    fn rebind(&self, ctx: &ElementContext) -> Self {
        Self {
            ctx: ctx.clone(),
            field_id: self.field_id,
            value: self.value,
        }
    }

    fn field_names(&self) -> Vec<&'static str> {
        vec!["field_id", "value"]
    }
}

impl Editable for ShaderField {}

struct FieldHeader {
    field_id: u32,
    type_code: u32,
    arity: u32,
    offset: u32,
    position: u64,
}

/// Header-grouped, payload-packed list of shader fields.
#[derive(Debug, PartialEq)]
pub struct ShaderFieldBlock {
    fields: DependentList<ShaderField>,
}

impl ShaderFieldBlock {
    pub fn new(ctx: &ElementContext) -> Self {
        Self {
            fields: DependentList::new(ctx, CountMode::External(CountWidth::U32)),
        }
    }

    #[inline]
    pub fn fields(&self) -> &DependentList<ShaderField> {
        &self.fields
    }

    #[inline]
    pub fn fields_mut(&mut self) -> &mut DependentList<ShaderField> {
        &mut self.fields
    }

    /// Append a field.
    pub fn add(&mut self, field_id: u32, value: ShaderValue) -> Result<()> {
        self.fields.push(&ShaderField::new(field_id, value)?)
    }

    /// Value of the first field with `field_id`.
    pub fn get(&self, field_id: u32) -> Option<&ShaderValue> {
        self.fields
            .iter()
            .find(|f| f.field_id == field_id)
            .map(|f| &f.value)
    }

    /// Encoded size of the whole block.
    pub fn encoded_len(&self) -> u64 {
        8 + self
            .fields
            .iter()
            .map(|f| SHADER_HEADER_SIZE + f.value.payload_size())
            .sum::<u64>()
    }

    /// Decode the block starting at the cursor (the anchor).
    pub fn decode(&mut self, cursor: &mut Cursor) -> Result<()> {
        let options = self.fields.context().options();
        let anchor = cursor.position();
        let count = cursor.read_u32()? as usize;
        let data_len = cursor.read_u32()? as u64;

        if (count as u64) * SHADER_HEADER_SIZE > cursor.remaining() {
            return Err(Error::format(
                anchor,
                format!("{} shader field headers overrun the buffer", count),
            ));
        }
        let mut headers = Vec::with_capacity(count);
        for _ in 0..count {
            let position = cursor.position();
            headers.push(FieldHeader {
                field_id: cursor.read_u32()?,
                type_code: cursor.read_u32()?,
                arity: cursor.read_u32()?,
                offset: cursor.read_u32()?,
                position,
            });
        }

        let payload_start = cursor.position();
        let payload_end = payload_start + data_len;
        let mut end = payload_start;
        let mut next = headers.iter();

        self.fields.decode_with(cursor, count, |ctx, cursor| {
            let header = next
                .next()
                .ok_or_else(|| Error::invariant("more shader fields than headers"))?;
            let at = anchor + header.offset as u64;
            if options.strict && (at < payload_start || at >= payload_end) {
                return Err(Error::Mismatch {
                    what: "shader payload offset",
                    position: header.position + 12,
                    expected: payload_start - anchor,
                    actual: header.offset as u64,
                });
            }
            cursor.seek(at)?;
            let value = ShaderValue::read(
                header.field_id,
                header.type_code,
                header.arity,
                header.position + 4,
                cursor,
            )?;
            end = end.max(cursor.position());
            Ok(ShaderField {
                ctx: ctx.clone(),
                field_id: header.field_id,
                value,
            })
        })?;

        if options.strict && end != payload_end {
            return Err(Error::Mismatch {
                what: "shader payload length",
                position: end,
                expected: data_len,
                actual: end - payload_start,
            });
        }
        cursor.seek(if options.strict { payload_end } else { end })?;
        Ok(())
    }

    /// Encode headers with placeholder offsets, then the packed payloads.
    pub fn encode(&self, cursor: &mut Cursor) -> Result<()> {
        let anchor = cursor.position();
        self.fields.write_count(cursor)?;
        let data_len = Placeholder::reserve_u32(cursor)?;

        let mut offsets = Vec::with_capacity(self.fields.len());
        for field in &self.fields {
            cursor.write_u32(field.field_id)?;
            cursor.write_u32(field.value.type_code())?;
            cursor.write_u32(field.value.arity())?;
            offsets.push(Placeholder::reserve_u32(cursor)?);
        }

        let payload_start = cursor.position();
        for (field, slot) in self.fields.iter().zip(&offsets) {
            slot.patch(cursor, relative(cursor.position(), anchor)?)?;
            field.value.write(cursor)?;
        }
        data_len.patch(cursor, relative(cursor.position(), payload_start)?)
    }

    /// Deep copy bound to a new owner.
    pub fn rebind(&self, ctx: &ElementContext) -> Self {
        Self {
            fields: self.fields.rebind(ctx),
        }
    }
}

fn relative(pos: u64, anchor: u64) -> Result<u32> {
    u32::try_from(pos - anchor)
        .map_err(|_| Error::invariant(format!("offset {} exceeds 32 bits", pos - anchor)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::DirtyState;
    use crate::util::ReadOptions;

    fn header(field_id: u32, type_code: u32, arity: u32, offset: u32) -> Vec<u8> {
        [field_id, type_code, arity, offset]
            .iter()
            .flat_map(|v| v.to_le_bytes())
            .collect()
    }

    fn single_field_block(field_id: u32, type_code: u32, arity: u32, payload: &[u8]) -> Vec<u8> {
        let mut v = Vec::new();
        v.extend_from_slice(&1u32.to_le_bytes());
        v.extend_from_slice(&(payload.len() as u32).to_le_bytes());
        v.extend(header(field_id, type_code, arity, 24));
        v.extend_from_slice(payload);
        v
    }

    fn decode(bytes: Vec<u8>) -> Result<ShaderFieldBlock> {
        let ctx = ElementContext::detached(1).with_options(ReadOptions::STRICT);
        let mut block = ShaderFieldBlock::new(&ctx);
        block.decode(&mut Cursor::from_bytes(bytes))?;
        Ok(block)
    }

    #[test]
    fn test_every_shape() -> Result<()> {
        let one = 1.0f32.to_le_bytes();
        let floats = |n: usize| one.repeat(n);
        let cases = [
            (FIELD_ALPHA, TYPE_FLOAT, 1, floats(1), ShaderValue::Float(1.0)),
            (FIELD_ALPHA, TYPE_FLOAT, 2, floats(2), ShaderValue::Float2(Vec2::ONE)),
            (FIELD_ALPHA, TYPE_FLOAT, 3, floats(3), ShaderValue::Float3(Vec3::ONE)),
            (FIELD_UV_SCALES, TYPE_FLOAT, 4, floats(4), ShaderValue::Float4(Vec4::ONE)),
            (FIELD_DIFFUSE_COLOR, TYPE_FLOAT, 4, floats(4), ShaderValue::Color(Vec4::ONE)),
            (FIELD_ALPHA, TYPE_INT, 1, 7i32.to_le_bytes().to_vec(), ShaderValue::Int(7)),
            (FIELD_DIFFUSE_MAP, TYPE_TEXTURE, 1, 2u32.to_le_bytes().to_vec(), ShaderValue::TextureRef(2)),
            (FIELD_NORMAL_MAP, TYPE_TEXTURE, 4, vec![0; 16], ShaderValue::TextureKey(Tgi::default())),
        ];
        for (field_id, type_code, arity, payload, expected) in cases {
            let block = decode(single_field_block(field_id, type_code, arity, &payload))?;
            assert_eq!(block.get(field_id), Some(&expected));
        }
        Ok(())
    }

    #[test]
    fn test_unknown_shape() {
        let err = decode(single_field_block(FIELD_ALPHA, TYPE_INT, 2, &[0; 8])).unwrap_err();
        assert!(matches!(
            err,
            Error::UnknownDiscriminant { family: "ShaderValue", value, position: 12 }
                if value == (2u64 << 32) | 2
        ));
    }

    #[test]
    fn test_encode_layout() -> Result<()> {
        let ctx = ElementContext::detached(1);
        let mut block = ShaderFieldBlock::new(&ctx);
        block.add(FIELD_ALPHA, ShaderValue::Float(0.5))?;
        block.add(FIELD_DIFFUSE_COLOR, ShaderValue::Color(Vec4::new(1.0, 0.0, 0.0, 1.0)))?;

        let mut c = Cursor::new();
        c.write_u32(0xDEAD_BEEF)?; // preceding owner field
        block.encode(&mut c)?;
        let bytes = c.as_bytes();
        assert_eq!(bytes.len() as u64, 4 + block.encoded_len());

        // count, then data length of the packed region
        assert_eq!(&bytes[4..8], &2u32.to_le_bytes());
        assert_eq!(&bytes[8..12], &20u32.to_le_bytes());
        // offsets are relative to the block anchor, payloads follow both headers
        assert_eq!(&bytes[24..28], &40u32.to_le_bytes());
        assert_eq!(&bytes[40..44], &44u32.to_le_bytes());
        assert_eq!(&bytes[44..48], &0.5f32.to_le_bytes());

        c.seek(4)?;
        let mut back = ShaderFieldBlock::new(&ctx);
        back.decode(&mut c)?;
        assert_eq!(back, block);
        assert_eq!(c.position(), c.len());
        Ok(())
    }

    #[test]
    fn test_empty_block_payload_length() -> Result<()> {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&0u32.to_le_bytes());
        bytes.extend_from_slice(&4u32.to_le_bytes());
        bytes.extend_from_slice(&[0xAA; 4]);

        let err = decode(bytes.clone()).unwrap_err();
        assert!(matches!(
            err,
            Error::Mismatch { what: "shader payload length", position: 8, expected: 4, actual: 0 }
        ));

        let ctx = ElementContext::detached(1).with_options(ReadOptions::LENIENT);
        let mut block = ShaderFieldBlock::new(&ctx);
        let mut c = Cursor::from_bytes(bytes);
        block.decode(&mut c)?;
        assert!(block.fields().is_empty());
        assert_eq!(c.position(), 8);
        Ok(())
    }

    #[test]
    fn test_nan_rewrite_is_redundant() -> Result<()> {
        let state = DirtyState::new();
        let ctx = ElementContext::new(1, state.handler());
        let mut block = ShaderFieldBlock::new(&ctx);
        block.add(FIELD_ALPHA, ShaderValue::Float(0.5))?;
        let field = block.fields_mut().get_mut(0).expect("field");
        field.set_value(ShaderValue::Float(f32::NAN))?;
        field.set_value(ShaderValue::Float(f32::NAN))?;
        assert_eq!(state.changes(), 2);

        // same number, different bits
        field.set_value(ShaderValue::Float(0.0))?;
        field.set_value(ShaderValue::Float(-0.0))?;
        assert_eq!(state.changes(), 4);
        Ok(())
    }

    #[test]
    fn test_color_only_on_color_fields() {
        assert!(ShaderField::new(FIELD_ALPHA, ShaderValue::Color(Vec4::ONE)).is_err());
        assert!(ShaderField::new(FIELD_DIFFUSE_COLOR, ShaderValue::Float4(Vec4::ONE)).is_err());
        assert!(ShaderField::new(FIELD_DIFFUSE_COLOR, ShaderValue::Color(Vec4::ONE)).is_ok());
    }
}
