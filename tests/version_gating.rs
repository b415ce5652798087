//! Version-gated fields: wire presence, accessors, and field listings.

mod common;

use common::{init_tracing, Bytes};
use resource_elements::prelude::*;

const NAME: u32 = 0xA1B2_C3D4;

/// Footprint with one rect-shaped area and no slots or keys.
fn rect_footprint(version: u32) -> Result<Resource<Footprint>> {
    let mut res: Resource<Footprint> = Resource::with_version(version)?;
    let fp = res.content_mut();
    let area = fp.areas_mut().add_default()?;
    area.set_name_hash(NAME);
    area.set_priority(1);
    area.set_type_flags(2);
    area.set_shape(&AreaShape::Rect(Rect::from_slice(&[0.0, 0.0, 2.0, 2.0])?));
    area.set_bounds(Rect::from_slice(&[0.0, 0.0, 2.0, 2.0])?);
    if version >= FOOTPRINT_HEIGHTS_VERSION {
        area.set_surface_flags(9)?;
        fp.set_max_height(4.0)?;
        fp.set_min_height(-1.0)?;
    }
    if version >= FOOTPRINT_ELEVATION_VERSION {
        fp.set_elevation_offset(0.5)?;
    }
    Ok(res)
}

fn rect_bytes(b: Bytes) -> Bytes {
    b.f32(0.0).f32(0.0).f32(2.0).f32(2.0)
}

/// Hand-built encoding of [`rect_footprint`].
fn expected_bytes(version: u32, offset: u32) -> Vec<u8> {
    let mut b = Bytes::new()
        .u32(version)
        .u32(offset)
        .u32(1) // key list length: just its count
        .u8(1) // one area
        .u32(NAME)
        .u8(1)
        .u32(2)
        .u8(3); // rect shape
    b = rect_bytes(rect_bytes(b));
    if version >= FOOTPRINT_HEIGHTS_VERSION {
        b = b.u32(9);
    }
    b = b.u8(0); // no slots
    if version >= FOOTPRINT_HEIGHTS_VERSION {
        b = b.f32(4.0).f32(-1.0);
    }
    if version >= FOOTPRINT_ELEVATION_VERSION {
        b = b.f32(0.5);
    }
    b.u8(0).build()
}

#[test]
fn test_footprint_layout_per_version() -> Result<()> {
    init_tracing();
    for (version, offset, total) in [(6u32, 44u32, 57usize), (7, 56, 69), (8, 60, 73)] {
        let res = rect_footprint(version)?;
        let bytes = res.bytes()?;
        assert_eq!(bytes.len(), total, "v{} size", version);
        assert_eq!(bytes, expected_bytes(version, offset), "v{} layout", version);

        let back = Resource::<Footprint>::from_bytes_with(&bytes, ReadOptions::STRICT)?;
        assert_eq!(back.content(), res.content());
    }
    Ok(())
}

#[test]
fn test_gated_accessors() -> Result<()> {
    let res = rect_footprint(FOOTPRINT_MIN_VERSION)?;
    let fp = res.content();
    let err = fp.max_height().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidState);
    assert!(matches!(
        err,
        Error::FieldNotAvailable { field: "max_height", required: 7, actual: 6 }
    ));
    assert!(fp.elevation_offset().is_err());
    assert!(fp.areas()[0].surface_flags().is_err());

    let res = rect_footprint(FOOTPRINT_HEIGHTS_VERSION)?;
    let fp = res.content();
    assert_eq!(fp.max_height()?, 4.0);
    assert_eq!(fp.areas()[0].surface_flags()?, 9);
    assert!(matches!(
        fp.elevation_offset().unwrap_err(),
        Error::FieldNotAvailable { field: "elevation_offset", required: 8, actual: 7 }
    ));
    Ok(())
}

#[test]
fn test_gated_setter_does_not_notify() -> Result<()> {
    let mut res = rect_footprint(FOOTPRINT_MIN_VERSION)?;
    res.bytes()?;
    let changes = res.change_count();
    assert!(res.content_mut().set_max_height(1.0).is_err());
    assert_eq!(res.change_count(), changes);
    assert!(!res.is_dirty());
    Ok(())
}

#[test]
fn test_field_names_follow_version() -> Result<()> {
    let v6: Resource<Footprint> = Resource::with_version(6)?;
    let v7: Resource<Footprint> = Resource::with_version(7)?;
    let v8: Resource<Footprint> = Resource::with_version(8)?;
    assert_eq!(v6.content().field_names(), ["version", "areas", "slots", "keys"]);
    assert!(v7.content().field_names().contains(&"min_height"));
    assert!(!v7.content().field_names().contains(&"elevation_offset"));
    assert!(v8.content().field_names().contains(&"elevation_offset"));

    let m0: Resource<ShaderMaterial> = Resource::with_version(MATERIAL_MIN_VERSION)?;
    assert!(!m0.content().field_names().contains(&"is_painting"));
    let c7: Resource<TextureCompositor> = Resource::with_version(COMPOSITOR_SKIP_VERSION)?;
    assert!(c7.content().field_names().contains(&"skip_short_side"));
    Ok(())
}

#[test]
fn test_version_change_reshapes_layout() -> Result<()> {
    let mut res = rect_footprint(FOOTPRINT_MIN_VERSION)?;
    res.bytes()?;
    let changes = res.change_count();

    res.content_mut().set_version(FOOTPRINT_ELEVATION_VERSION)?;
    assert_eq!(res.change_count(), changes + 1, "one notification for the version change");
    assert!(res.is_dirty());
    assert_eq!(res.content().areas()[0].surface_flags()?, 0);

    let bytes = res.bytes()?;
    assert_eq!(bytes.len(), 73);
    let back = Resource::<Footprint>::from_bytes_with(&bytes, ReadOptions::STRICT)?;
    assert_eq!(back.content().elevation_offset()?, 0.0);
    assert_eq!(back.content().version(), FOOTPRINT_ELEVATION_VERSION);

    assert_eq!(
        res.content_mut().set_version(4).unwrap_err().kind(),
        ErrorKind::InvalidState
    );
    Ok(())
}

#[test]
fn test_material_flags_gate() -> Result<()> {
    let mut res: Resource<ShaderMaterial> = Resource::with_version(MATERIAL_MIN_VERSION)?;
    assert!(res.content_mut().set_painting(true).is_err());
    let old = res.bytes()?;

    res.content_mut().set_version(MATERIAL_FLAGS_VERSION)?;
    res.content_mut().set_video_surface(true)?;
    let new = res.bytes()?;
    assert_eq!(new.len(), old.len() + 8);
    assert_eq!(&new[20..24], &1u32.to_le_bytes());
    Ok(())
}

#[test]
fn test_versions_below_minimum_rejected() {
    for version in [0, 2, FOOTPRINT_MIN_VERSION - 1] {
        let err = Resource::<Footprint>::with_version(version).err().expect("too old");
        assert_eq!(err.kind(), ErrorKind::InvalidState);
    }
    assert!(Resource::<ShaderMaterial>::with_version(MATERIAL_MIN_VERSION - 1).is_err());
    assert!(Resource::<TextureCompositor>::with_version(COMPOSITOR_MIN_VERSION - 1).is_err());
    assert!(Resource::<TextureCompositor>::with_version(COMPOSITOR_MIN_VERSION).is_ok());
}

#[test]
fn test_material_flag_must_be_boolean() {
    let bytes = Bytes::new()
        .u32(MATERIAL_FLAGS_VERSION)
        .u32(24)
        .u32(4)
        .u32(0)
        .u32(0)
        .u32(2) // not a boolean
        .u32(0)
        .u32(0)
        .u32(0)
        .u32(0)
        .build();
    let err = Resource::<ShaderMaterial>::from_bytes_with(&bytes, ReadOptions::STRICT)
        .err()
        .expect("decode must fail");
    assert!(matches!(err, Error::Format { position: 20, .. }));
}
