//! Texture compositor chunk.
//!
//! ```text
//! version u32
//! keys: u8 count, (type u32, group u32, instance u64)...
//! step_count u16
//! v >= 7: skip_short_side u8
//! steps: step_count x CompositorStep
//! ```
//!
//! A step is a run of compositor entries closed by a zero discriminant.
//! The step count sits in the header ahead of the gated fields, so the step
//! list is externally counted.

use tracing::trace;

use crate::core::{
    unlocked_fields, update, Codec, CountMode, CountWidth, DependentList, Editable, Element,
    ElementContext, Schema, TgiList, TgiOrder, VersionGate,
};
use crate::stream::Cursor;
use crate::util::{Error, Result};
use crate::variant::{CompositorEntry, CompositorValue};

/// Oldest supported compositor version.
pub const COMPOSITOR_MIN_VERSION: u32 = 6;
/// Adds `skip_short_side`.
pub const COMPOSITOR_SKIP_VERSION: u32 = 7;
/// Version written by default.
pub const COMPOSITOR_VERSION: u32 = COMPOSITOR_SKIP_VERSION;

const SKIP_SHORT_SIDE: VersionGate = VersionGate::new("skip_short_side", COMPOSITOR_SKIP_VERSION);

pub(crate) const COMPOSITOR_GATES: [VersionGate; 1] = [SKIP_SHORT_SIDE];

/// One compositing step: a terminated run of entries.
#[derive(Debug, PartialEq)]
pub struct CompositorStep {
    entries: DependentList<CompositorEntry>,
}

impl CompositorStep {
    #[inline]
    pub fn entries(&self) -> &DependentList<CompositorEntry> {
        &self.entries
    }

    #[inline]
    pub fn entries_mut(&mut self) -> &mut DependentList<CompositorEntry> {
        &mut self.entries
    }

    /// Append an entry.
    pub fn add(&mut self, property: u32, value: CompositorValue) -> Result<()> {
        self.entries.push(&CompositorEntry::new(property, value)?)
    }

    /// Value of the first entry for `property`.
    pub fn get(&self, property: u32) -> Option<&CompositorValue> {
        self.entries
            .iter()
            .find(|e| e.property() == property)
            .map(|e| e.value())
    }
}

impl Element for CompositorStep {
    fn fresh(ctx: &ElementContext) -> Self {
        Self {
            entries: DependentList::new(ctx, CountMode::Terminated),
        }
    }

    fn rebind(&self, ctx: &ElementContext) -> Self {
        Self {
            entries: self.entries.rebind(ctx),
        }
    }

    fn field_names(&self) -> Vec<&'static str> {
        vec!["entries"]
    }
}

impl Editable for CompositorStep {}

impl Codec for CompositorStep {
    fn read(ctx: &ElementContext, cursor: &mut Cursor) -> Result<Self> {
        let mut step = Self::fresh(ctx);
        step.entries.decode_terminated(cursor)?;
        Ok(step)
    }

    fn write(&self, cursor: &mut Cursor) -> Result<()> {
        self.entries.encode_terminated(cursor)
    }
}

/// Texture compositor resource.
#[derive(Debug, PartialEq)]
pub struct TextureCompositor {
    ctx: ElementContext,
    keys: TgiList,
    skip_short_side: u8,
    steps: DependentList<CompositorStep>,
}

impl TextureCompositor {
    #[inline]
    pub fn keys(&self) -> &TgiList {
        &self.keys
    }

    #[inline]
    pub fn keys_mut(&mut self) -> &mut TgiList {
        &mut self.keys
    }

    #[inline]
    pub fn steps(&self) -> &DependentList<CompositorStep> {
        &self.steps
    }

    #[inline]
    pub fn steps_mut(&mut self) -> &mut DependentList<CompositorStep> {
        &mut self.steps
    }

    pub fn skip_short_side(&self) -> Result<u8> {
        SKIP_SHORT_SIDE.check(self.version())?;
        Ok(self.skip_short_side)
    }

    pub fn set_skip_short_side(&mut self, value: u8) -> Result<()> {
        SKIP_SHORT_SIDE.check(self.version())?;
        update(&mut self.skip_short_side, value, self.ctx.handler());
        Ok(())
    }

    /// Change the format version.
    pub fn set_version(&mut self, version: u32) -> Result<()> {
        if version < COMPOSITOR_MIN_VERSION {
            return Err(Error::invalid_state(format!(
                "compositor version {:#x} is below the minimum {:#x}",
                version, COMPOSITOR_MIN_VERSION
            )));
        }
        if version != self.version() {
            self.ctx.set_version(version);
            self.steps.set_version(version);
            self.ctx.notify();
        }
        Ok(())
    }

    /// Check that every key entry indexes into the key list.
    pub fn validate_key_refs(&self) -> Result<()> {
        for (i, step) in self.steps.iter().enumerate() {
            for entry in step.entries() {
                if let CompositorValue::Key(index) = entry.value() {
                    if *index as usize >= self.keys.len() {
                        return Err(Error::invalid_state(format!(
                            "step {} property {:#x} references key {} of {}",
                            i,
                            entry.property(),
                            index,
                            self.keys.len()
                        )));
                    }
                }
            }
        }
        Ok(())
    }
}

impl Element for TextureCompositor {
    fn fresh(ctx: &ElementContext) -> Self {
        Self {
            ctx: ctx.clone(),
            keys: TgiList::new(ctx, CountWidth::U8, TgiOrder::Tgi),
            skip_short_side: 0,
            steps: DependentList::new(ctx, CountMode::External(CountWidth::U16)),
        }
    }

    fn rebind(&self, ctx: &ElementContext) -> Self {
        let ctx = ctx.with_version(self.version());
        Self {
            keys: self.keys.rebind(&ctx),
            skip_short_side: self.skip_short_side,
            steps: self.steps.rebind(&ctx),
            ctx,
        }
    }

    fn field_names(&self) -> Vec<&'static str> {
        unlocked_fields(self.version(), &["version", "keys", "steps"], &COMPOSITOR_GATES)
    }
}

impl Codec for TextureCompositor {
    fn read(ctx: &ElementContext, cursor: &mut Cursor) -> Result<Self> {
        let pos = cursor.position();
        let version = cursor.read_u32()?;
        if version < COMPOSITOR_MIN_VERSION {
            return Err(Error::format(
                pos,
                format!("unsupported compositor version {:#x}", version),
            ));
        }
        let ctx = ctx.with_version(version);

        let mut keys = TgiList::new(&ctx, CountWidth::U8, TgiOrder::Tgi);
        keys.decode(cursor)?;
        let step_count = CountWidth::U16.read(cursor)?;
        let skip_short_side = if SKIP_SHORT_SIDE.is_open(version) {
            cursor.read_u8()?
        } else {
            0
        };

        let mut steps = DependentList::new(&ctx, CountMode::External(CountWidth::U16));
        steps.decode_counted(cursor, step_count)?;
        trace!(steps = step_count, keys = keys.len(), "decoded texture compositor");

        Ok(Self {
            ctx,
            keys,
            skip_short_side,
            steps,
        })
    }

    fn write(&self, cursor: &mut Cursor) -> Result<()> {
        cursor.write_u32(self.version())?;
        self.keys.encode(cursor)?;
        self.steps.write_count(cursor)?;
        if SKIP_SHORT_SIDE.is_open(self.version()) {
            cursor.write_u8(self.skip_short_side)?;
        }
        self.steps.encode(cursor)
    }
}

impl Schema for TextureCompositor {
    const NAME: &'static str = "TextureCompositor";
    const MIN_VERSION: u32 = COMPOSITOR_MIN_VERSION;
    const DEFAULT_VERSION: u32 = COMPOSITOR_VERSION;

    fn version(&self) -> u32 {
        self.ctx.version()
    }
}
