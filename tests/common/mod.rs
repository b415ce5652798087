//! Shared fixtures for integration tests.

#![allow(dead_code)]

use glam::Vec2;
use resource_elements::prelude::*;
use tracing_subscriber::EnvFilter;

/// Route library tracing to the test harness (`RUST_LOG=trace` to see it).
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Little-endian byte buffer builder for hand-written expectations.
#[derive(Default)]
pub struct Bytes(pub Vec<u8>);

impl Bytes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn u8(mut self, v: u8) -> Self {
        self.0.push(v);
        self
    }

    pub fn u16(mut self, v: u16) -> Self {
        self.0.extend_from_slice(&v.to_le_bytes());
        self
    }

    pub fn u32(mut self, v: u32) -> Self {
        self.0.extend_from_slice(&v.to_le_bytes());
        self
    }

    pub fn u64(mut self, v: u64) -> Self {
        self.0.extend_from_slice(&v.to_le_bytes());
        self
    }

    pub fn f32(mut self, v: f32) -> Self {
        self.0.extend_from_slice(&v.to_le_bytes());
        self
    }

    pub fn raw(mut self, v: &[u8]) -> Self {
        self.0.extend_from_slice(v);
        self
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn build(self) -> Vec<u8> {
        self.0
    }
}

/// Square polygon used by footprint fixtures.
pub const SQUARE: [Vec2; 4] = [
    Vec2::new(0.0, 0.0),
    Vec2::new(1.0, 0.0),
    Vec2::new(1.0, 1.0),
    Vec2::new(0.0, 1.0),
];

/// Footprint with one polygon area, one circle slot and two keys.
pub fn sample_footprint(version: u32) -> Resource<Footprint> {
    let mut res: Resource<Footprint> = Resource::with_version(version).expect("supported version");
    let fp = res.content_mut();

    let area = fp.areas_mut().add_default().expect("add area");
    area.set_name_hash(0x1234_5678);
    area.set_priority(-2);
    area.set_type_flags(0x11);
    let square = AreaShape::polygon_from(&ElementContext::detached(version), &SQUARE)
        .expect("polygon");
    area.set_shape(&square);
    area.set_bounds(Rect::from_slice(&[0.0, 0.0, 1.0, 1.0]).expect("rect"));
    if version >= FOOTPRINT_HEIGHTS_VERSION {
        area.set_surface_flags(0x4).expect("surface flags");
    }

    let slot = fp.slots_mut().add_default().expect("add slot");
    slot.set_shape(&AreaShape::Circle { center: Vec2::new(0.5, 0.5), radius: 0.25 });

    if version >= FOOTPRINT_HEIGHTS_VERSION {
        fp.set_max_height(3.5).expect("max height");
        fp.set_min_height(-0.5).expect("min height");
    }
    if version >= FOOTPRINT_ELEVATION_VERSION {
        fp.set_elevation_offset(0.125).expect("elevation");
    }
    fp.keys_mut().push(Tgi::new(0xD382_BF57, 0, 0xAAAA)).expect("key");
    fp.keys_mut().push(Tgi::new(0x00B2_D882, 1, 0xBBBB)).expect("key");
    res
}

/// Shader material with a colour, a scalar, an inline key and a key-list texture.
pub fn sample_material(version: u32) -> Resource<ShaderMaterial> {
    let mut res: Resource<ShaderMaterial> = Resource::with_version(version).expect("supported version");
    let mat = res.content_mut();
    mat.set_name_hash(0xCAFE);
    mat.set_shader_hash(0x8D34_6BBC);
    if version >= MATERIAL_FLAGS_VERSION {
        mat.set_painting(true).expect("painting");
    }
    let fields = mat.fields_mut();
    fields
        .add(FIELD_DIFFUSE_COLOR, ShaderValue::Color(glam::Vec4::new(1.0, 0.5, 0.25, 1.0)))
        .expect("colour");
    fields.add(FIELD_ALPHA, ShaderValue::Float(0.75)).expect("alpha");
    fields
        .add(FIELD_NORMAL_MAP, ShaderValue::TextureKey(Tgi::new(0x00B2_D882, 0, 0x77)))
        .expect("normal map");
    mat.set_texture(FIELD_DIFFUSE_MAP, Tgi::new(0x00B2_D882, 0, 0x99))
        .expect("diffuse map");
    res
}

/// Compositor with two steps, one referencing a key.
pub fn sample_compositor(version: u32) -> Resource<TextureCompositor> {
    let mut res: Resource<TextureCompositor> = Resource::with_version(version).expect("supported version");
    let tc = res.content_mut();
    tc.keys_mut().push(Tgi::new(0x00B2_D882, 0, 0x42)).expect("key");
    if version >= COMPOSITOR_SKIP_VERSION {
        tc.set_skip_short_side(1).expect("skip");
    }
    let step = tc.steps_mut().add_default().expect("step");
    step.add(0x10, CompositorValue::Key(0)).expect("entry");
    step.add(0x11, CompositorValue::Float(0.5)).expect("entry");
    let step = tc.steps_mut().add_default().expect("step");
    step.add(0x20, CompositorValue::Text("overlay".into())).expect("entry");
    step.add(0x21, CompositorValue::Bool(true)).expect("entry");
    step.add(0x22, CompositorValue::Vec2(Vec2::new(0.5, 2.0))).expect("entry");
    res
}
