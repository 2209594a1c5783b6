//! Full-pipeline smoke tests: card JSON through the render client, the
//! spawned surface thread, and the SVG rasterizer, back to decodable pixels.

use platen::{
    CardDef, LayerFragment, RasterSize, RasterizerKind, RasterizerOpts, RenderClient,
    RenderClientOpts, RenderServerOpts, decode_png,
};
use serde_json::json;
use std::time::Duration;

fn opts(viewport: RasterSize) -> RenderClientOpts {
    RenderClientOpts {
        rasterizer: RasterizerKind::Svg,
        rasterizer_opts: RasterizerOpts {
            resources_dir: None,
            viewport: Some(viewport),
        },
        server: RenderServerOpts {
            settle_delay: Duration::ZERO,
        },
        surface_ready_timeout: Duration::from_secs(10),
        round_trip_timeout: Duration::from_secs(30),
    }
}

fn layer(css: &str, html: &str) -> LayerFragment {
    LayerFragment {
        css: css.to_owned(),
        html: html.to_owned(),
    }
}

#[test]
fn renders_a_card_to_a_png_of_the_exact_requested_size() {
    let card = CardDef {
        width: 64,
        height: 40,
        layers: vec![layer(
            "",
            "<rect width=\"64\" height=\"40\" fill=\"{{$$.[0]}}\"/>",
        )],
        data: vec![vec![json!("#ff0000")], vec![json!("#0000ff")]],
    };
    let client = RenderClient::new(opts(RasterSize::new(64, 40).unwrap()));

    let uri = client.render(&card, 0).unwrap().expect("renderable card");
    let bmp = decode_png(&uri).unwrap();
    assert_eq!((bmp.width, bmp.height), (64, 40));
    assert_eq!(bmp.data[3], 255, "expected an opaque fill");
    assert!(bmp.data[0] > 200, "expected red, got {:?}", &bmp.data[..4]);

    // Second render reuses the cached surface and channel; a different row
    // produces different pixels.
    let uri2 = client.render(&card, 1).unwrap().expect("renderable card");
    let bmp2 = decode_png(&uri2).unwrap();
    assert_eq!((bmp2.width, bmp2.height), (64, 40));
    assert!(bmp2.data[2] > 200, "expected blue, got {:?}", &bmp2.data[..4]);
}

#[test]
fn later_layers_paint_over_earlier_ones() {
    let card = CardDef {
        width: 16,
        height: 16,
        layers: vec![
            layer("", "<rect width=\"16\" height=\"16\" fill=\"#000000\"/>"),
            layer("", "<rect width=\"16\" height=\"16\" fill=\"#00ff00\"/>"),
        ],
        data: vec![vec![json!(null)]],
    };
    let client = RenderClient::new(opts(RasterSize::new(16, 16).unwrap()));

    let uri = client.render(&card, 0).unwrap().expect("renderable card");
    let bmp = decode_png(&uri).unwrap();
    // The topmost (last) layer wins.
    assert!(bmp.data[1] > 200, "expected green, got {:?}", &bmp.data[..4]);
}

#[test]
fn stylesheet_templates_expand_before_rasterization() {
    let card = CardDef {
        width: 8,
        height: 8,
        layers: vec![layer(
            ".bg { fill: {{$$.[0]}}; }",
            "<rect class=\"bg\" width=\"8\" height=\"8\"/>",
        )],
        data: vec![vec![json!("#ff0000")]],
    };
    let client = RenderClient::new(opts(RasterSize::new(8, 8).unwrap()));

    let uri = client.render(&card, 0).unwrap().expect("renderable card");
    let bmp = decode_png(&uri).unwrap();
    assert!(bmp.data[0] > 200, "expected red via css, got {:?}", &bmp.data[..4]);
}

#[test]
fn dataless_card_yields_nothing_to_show() {
    let card = CardDef {
        width: 8,
        height: 8,
        layers: vec![layer("", "<rect width=\"8\" height=\"8\"/>")],
        data: Vec::new(),
    };
    let client = RenderClient::new(opts(RasterSize::new(8, 8).unwrap()));
    assert_eq!(client.render(&card, 0).unwrap(), None);
}
