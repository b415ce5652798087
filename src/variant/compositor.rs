//! Texture compositor entries: single-byte discriminant where 0 ends the sequence.

use glam::Vec2;

use super::shape::{read_vec2, write_vec2};
use super::{read_tag, unknown_discriminant};
use crate::core::{update, BitEq, Codec, Editable, Element, ElementContext, Terminated};
use crate::stream::Cursor;
use crate::util::{Error, Result};

const TAG_END: u8 = 0;
const TAG_BOOL: u8 = 1;
const TAG_INT: u8 = 2;
const TAG_FLOAT: u8 = 3;
const TAG_VEC2: u8 = 4;
const TAG_COLOR: u8 = 5;
const TAG_KEY: u8 = 6;
const TAG_TEXT: u8 = 7;

/// Value carried by one compositor entry.
#[derive(Clone, Debug, PartialEq)]
pub enum CompositorValue {
    /// End-of-sequence marker; never stored in a decoded sequence.
    End,
    Bool(bool),
    Int(i32),
    Float(f32),
    Vec2(Vec2),
    /// Packed ARGB.
    Color(u32),
    /// Index into the owning resource's key list.
    Key(u8),
    Text(String),
}

impl CompositorValue {
    /// Wire discriminant.
    pub fn discriminant(&self) -> u8 {
        match self {
            Self::End => TAG_END,
            Self::Bool(_) => TAG_BOOL,
            Self::Int(_) => TAG_INT,
            Self::Float(_) => TAG_FLOAT,
            Self::Vec2(_) => TAG_VEC2,
            Self::Color(_) => TAG_COLOR,
            Self::Key(_) => TAG_KEY,
            Self::Text(_) => TAG_TEXT,
        }
    }

    #[inline]
    pub fn is_end(&self) -> bool {
        matches!(self, Self::End)
    }

    /// Encoded payload size. The terminal has no payload.
    pub fn payload_size(&self) -> Result<usize> {
        Ok(match self {
            Self::End => return Err(terminal_payload()),
            Self::Bool(_) | Self::Key(_) => 1,
            Self::Int(_) | Self::Float(_) | Self::Color(_) => 4,
            Self::Vec2(_) => 8,
            Self::Text(s) => 2 + s.len(),
        })
    }

    fn read_payload(tag: u8, position: u64, cursor: &mut Cursor) -> Result<Self> {
        Ok(match tag {
            TAG_BOOL => {
                let pos = cursor.position();
                match cursor.read_u8()? {
                    0 => Self::Bool(false),
                    1 => Self::Bool(true),
                    v => return Err(Error::format(pos, format!("invalid boolean byte {:#x}", v))),
                }
            }
            TAG_INT => Self::Int(cursor.read_i32()?),
            TAG_FLOAT => Self::Float(cursor.read_f32()?),
            TAG_VEC2 => Self::Vec2(read_vec2(cursor)?),
            TAG_COLOR => Self::Color(cursor.read_u32()?),
            TAG_KEY => Self::Key(cursor.read_u8()?),
            TAG_TEXT => {
                let len = cursor.read_u16()? as usize;
                let pos = cursor.position();
                let bytes = cursor.read_bytes(len)?;
                let text = String::from_utf8(bytes)
                    .map_err(|e| Error::format(pos, format!("invalid UTF-8 text: {}", e)))?;
                Self::Text(text)
            }
            other => return Err(unknown_discriminant("CompositorValue", other as u64, position)),
        })
    }

    fn write_payload(&self, cursor: &mut Cursor) -> Result<()> {
        match self {
            Self::End => Err(terminal_payload()),
            Self::Bool(v) => cursor.write_u8(*v as u8),
            Self::Int(v) => cursor.write_i32(*v),
            Self::Float(v) => cursor.write_f32(*v),
            Self::Vec2(v) => write_vec2(cursor, *v),
            Self::Color(v) => cursor.write_u32(*v),
            Self::Key(v) => cursor.write_u8(*v),
            Self::Text(s) => {
                let len = u16::try_from(s.len()).map_err(|_| Error::CountOverflow {
                    count: s.len(),
                    max: u16::MAX as usize,
                })?;
                cursor.write_u16(len)?;
                cursor.write_bytes(s.as_bytes())
            }
        }
    }
}

impl BitEq for CompositorValue {
    fn bit_eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Float(a), Self::Float(b)) => a.bit_eq(b),
            (Self::Vec2(a), Self::Vec2(b)) => a.bit_eq(b),
            _ => self == other,
        }
    }
}

fn terminal_payload() -> Error {
    Error::invalid_state("end-of-sequence entry has no payload")
}

/// One (property, value) pair of a compositor step.
#[derive(Debug, PartialEq)]
pub struct CompositorEntry {
    ctx: ElementContext,
    property: u32,
    value: CompositorValue,
}

impl CompositorEntry {
    /// Detached entry; lists rebind it on insertion.
    pub fn new(property: u32, value: CompositorValue) -> Result<Self> {
        if value.is_end() {
            return Err(Error::invalid_state("cannot build an end-of-sequence entry"));
        }
        Ok(Self {
            ctx: ElementContext::default(),
            property,
            value,
        })
    }

    /// Property id (0 for the terminal).
    #[inline]
    pub fn property(&self) -> u32 {
        self.property
    }

    /// Raw value, including the terminal.
    #[inline]
    pub fn value(&self) -> &CompositorValue {
        &self.value
    }

    /// Value of a real entry.
    pub fn payload(&self) -> Result<&CompositorValue> {
        if self.value.is_end() {
            return Err(terminal_payload());
        }
        Ok(&self.value)
    }

    pub fn set_property(&mut self, property: u32) {
        update(&mut self.property, property, self.ctx.handler());
    }

    /// Replace the value. The terminal cannot be stored this way.
    pub fn set_value(&mut self, value: CompositorValue) -> Result<()> {
        if value.is_end() {
            return Err(Error::invalid_state(
                "end-of-sequence marker cannot be assigned to an entry",
            ));
        }
        update(&mut self.value, value, self.ctx.handler());
        Ok(())
    }
}

impl Element for CompositorEntry {
    fn fresh(ctx: &ElementContext) -> Self {
        Self {
            ctx: ctx.clone(),
            property: 0,
            value: CompositorValue::Int(0),
        }
    }

    fn rebind(&self, ctx: &ElementContext) -> Self {
        Self {
            ctx: ctx.clone(),
            property: self.property,
            value: self.value.clone(),
        }
    }

    fn field_names(&self) -> Vec<&'static str> {
        if self.value.is_end() {
            Vec::new()
        } else {
            vec!["property", "value"]
        }
    }
}

impl Editable for CompositorEntry {}

impl Codec for CompositorEntry {
    fn read(ctx: &ElementContext, cursor: &mut Cursor) -> Result<Self> {
        let (tag, position) = read_tag(cursor)?;
        if tag == TAG_END {
            return Ok(Self::terminal(ctx));
        }
        if tag > TAG_TEXT {
            return Err(unknown_discriminant("CompositorValue", tag as u64, position));
        }
        let property = cursor.read_u32()?;
        let value = CompositorValue::read_payload(tag, position, cursor)?;
        Ok(Self {
            ctx: ctx.clone(),
            property,
            value,
        })
    }

    fn write(&self, cursor: &mut Cursor) -> Result<()> {
        cursor.write_u8(self.value.discriminant())?;
        if self.value.is_end() {
            return Ok(());
        }
        cursor.write_u32(self.property)?;
        self.value.write_payload(cursor)
    }
}

impl Terminated for CompositorEntry {
    fn is_terminal(&self) -> bool {
        self.value.is_end()
    }

    fn terminal(ctx: &ElementContext) -> Self {
        Self {
            ctx: ctx.clone(),
            property: 0,
            value: CompositorValue::End,
        }
    }
}
