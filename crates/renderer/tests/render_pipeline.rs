//! Composited planes rendered end to end into PNG output.

use std::sync::Arc;

use compositor::{CompositorConfig, DataKindRegistry, OutputDepth, TileCompositor};
use renderer::plane_to_png;
use storage::{DatasetMetadata, MemoryDataset, MemoryDriver};
use tile_common::{DatasetKey, GeoBounds, MaskedGrid, TileCoord};

fn wind_driver() -> MemoryDriver {
    let mut driver = MemoryDriver::new(vec!["product", "section_x", "section_y"]);
    driver.insert(
        &DatasetKey::new(vec![
            ("product".into(), "wind_u".into()),
            ("section_x".into(), "1".into()),
            ("section_y".into(), "1".into()),
        ]),
        MemoryDataset::new(
            DatasetMetadata {
                bounds: GeoBounds::new(128.0, 30.0, 146.0, 46.0),
                native_width: 64,
                native_height: 64,
                valid_time: None,
            },
            MaskedGrid::filled(150.0, 64, 64),
        ),
    );
    driver
}

#[tokio::test]
async fn wind_component_renders_as_gray_alpha_png() {
    let compositor = TileCompositor::new(
        Arc::new(wind_driver()),
        DataKindRegistry::with_builtin_kinds().unwrap(),
        CompositorConfig::default(),
    )
    .unwrap();

    // Zoom-2 tile over the north-west Pacific: the dataset covers part
    // of it, so the plane carries both readings and sentinel pixels
    let plane = compositor
        .render_tile(
            &[
                "wind_u".to_string(),
                "1".to_string(),
                "1".to_string(),
            ],
            TileCoord::new(2, 3, 1),
            Some((16, 16)),
        )
        .await
        .unwrap();

    assert_eq!(plane.depth, OutputDepth::U16);
    // 150 centi-m/s shifted by the 32768 bias
    assert!(plane.samples.contains(&(32768 + 150)));
    assert!(plane.samples.contains(&65535));

    let png = plane_to_png(&plane, 6).unwrap();
    assert_eq!(&png[0..8], &[137, 80, 78, 71, 13, 10, 26, 10]);
    assert_eq!(&png[16..20], &16u32.to_be_bytes());
    assert_eq!(png[24], 8); // bit depth
    assert_eq!(png[25], 4); // color type 4 = gray + alpha
}

#[tokio::test]
async fn wind_png_is_byte_identical_across_requests() {
    let compositor = TileCompositor::new(
        Arc::new(wind_driver()),
        DataKindRegistry::with_builtin_kinds().unwrap(),
        CompositorConfig::default(),
    )
    .unwrap();

    let keys = [
        "wind_u".to_string(),
        "1".to_string(),
        "1".to_string(),
    ];
    let tile = TileCoord::new(2, 3, 1);

    let a = compositor.render_tile(&keys, tile, Some((16, 16))).await.unwrap();
    let b = compositor.render_tile(&keys, tile, Some((16, 16))).await.unwrap();

    assert_eq!(
        plane_to_png(&a, 6).unwrap(),
        plane_to_png(&b, 6).unwrap()
    );
}
