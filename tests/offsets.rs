//! Trailing key list placement and count-width limits.

mod common;

use common::{init_tracing, Bytes};
use resource_elements::prelude::*;

fn footprint_with_keys(count: usize) -> Result<Resource<Footprint>> {
    let mut res: Resource<Footprint> = Resource::new();
    for i in 0..count {
        res.content_mut()
            .keys_mut()
            .push(Tgi::new(0x00B2_D882, 0, i as u64))?;
    }
    Ok(res)
}

#[test]
fn test_key_header_patched_for_each_list_size() -> Result<()> {
    init_tracing();
    // version + header + two empty area lists + heights + elevation
    const KEYS_START: usize = 4 + 8 + 1 + 1 + 8 + 4;

    for count in [0usize, 1, 255] {
        let res = footprint_with_keys(count)?;
        let bytes = res.bytes()?;
        let length = 1 + 16 * count;
        assert_eq!(bytes.len(), KEYS_START + length);

        let offset = u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]);
        let stored_len = u32::from_le_bytes([bytes[8], bytes[9], bytes[10], bytes[11]]);
        assert_eq!(offset as usize, KEYS_START - 12, "offset is relative to the header end");
        assert_eq!(stored_len as usize, length);
        assert_eq!(bytes[KEYS_START] as usize, count);

        let back = Resource::<Footprint>::from_bytes_with(&bytes, ReadOptions::STRICT)?;
        assert_eq!(back.content().keys().len(), count);
        assert_eq!(back.content(), res.content());
    }
    Ok(())
}

#[test]
fn test_itg_key_order_on_wire() -> Result<()> {
    let res = footprint_with_keys(1)?;
    let bytes = res.bytes()?;
    let key = &bytes[bytes.len() - 16..];
    assert_eq!(&key[..8], &0u64.to_le_bytes());
    assert_eq!(&key[8..12], &0x00B2_D882u32.to_le_bytes());
    assert_eq!(&key[12..], &0u32.to_le_bytes());
    Ok(())
}

#[test]
fn test_u8_count_boundary() -> Result<()> {
    let mut res = footprint_with_keys(255)?;
    let err = res
        .content_mut()
        .keys_mut()
        .push(Tgi::new(1, 1, 1))
        .unwrap_err();
    assert!(matches!(err, Error::CountOverflow { count: 256, max: 255 }));
    assert_eq!(res.content().keys().len(), 255);
    Ok(())
}

#[test]
fn test_polygon_point_limit() -> Result<()> {
    let ctx = ElementContext::detached(FOOTPRINT_VERSION);
    let mut shape = AreaShape::polygon(&ctx);
    let points = shape.points_mut().expect("polygon");
    for _ in 0..255 {
        points.add_default()?;
    }
    assert!(matches!(
        points.add_default().unwrap_err(),
        Error::CountOverflow { count: 256, max: 255 }
    ));
    Ok(())
}

#[test]
fn test_decoded_count_above_limit() {
    // external u16 step count larger than the configured maximum
    let ctx = ElementContext::detached(COMPOSITOR_VERSION);
    let mut steps: DependentList<CompositorStep> =
        DependentList::new(&ctx, CountMode::External(CountWidth::U16)).with_max_count(2);
    let mut cursor = Cursor::from_bytes(vec![0u8, 0, 0]);
    let err = steps.decode_counted(&mut cursor, 3).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Format);
    assert!(steps.is_empty());
}

#[test]
fn test_material_u32_key_count() -> Result<()> {
    let mut res: Resource<ShaderMaterial> = Resource::with_version(MATERIAL_MIN_VERSION)?;
    res.content_mut().set_name_hash(7);
    res.content_mut().keys_mut().push(Tgi::new(1, 2, 3))?;

    let expected = Bytes::new()
        .u32(MATERIAL_MIN_VERSION)
        .u32(16) // name, shader, field count, field data length
        .u32(4 + 16)
        .u32(7)
        .u32(0)
        .u32(0) // no fields
        .u32(0) // no payload
        .u32(1)
        .u32(1)
        .u32(2)
        .u64(3)
        .build();
    assert_eq!(res.bytes()?, expected);
    Ok(())
}
