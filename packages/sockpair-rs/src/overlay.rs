//! Per-pair annotations drawn in registration with the displayed photo.
//!
//! Rendering happens in two steps: [`OverlayRenderer::render`] builds an
//! [`OverlayScene`] in the pixel space of the current display size, and
//! [`OverlayScene::to_svg`] serializes it. The SVG declares a `viewBox` equal
//! to the display size, so it scales together with the image.
use std::fmt::Write as _;

use sockpair_vision::{ImageData, SockPair};

use crate::coordinates::{center, scale_box, Dimensions, Point, ScaledBox};

pub const CONNECTOR_STROKE_WIDTH: f64 = 3.0;
pub const CONNECTOR_DASH: &str = "5,5";
pub const CONNECTOR_ANIMATION: &str = "dash 10s linear infinite";
pub const BOX_FILL_OPACITY: f64 = 0.2;
pub const BOX_STROKE_WIDTH: f64 = 2.0;
pub const BOX_CORNER_RADIUS: f64 = 4.0;
pub const MARKER_RADIUS: f64 = 12.0;
pub const MARKER_FONT_SIZE: f64 = 10.0;
pub const MARKER_TEXT_COLOR: &str = "white";

/// Dashed line between the centers of a pair's two boxes.
#[derive(Debug, Clone, PartialEq)]
pub struct Connector {
    pub from: Point,
    pub to: Point,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BoxShape {
    pub bounds: ScaledBox,
}

/// Filled disk at a box center carrying the pair's 1-based number.
#[derive(Debug, Clone, PartialEq)]
pub struct Marker {
    pub at: Point,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PairLayer {
    pub index: usize,
    pub color: String,
    pub connector: Connector,
    pub boxes: [BoxShape; 2],
    pub markers: [Marker; 2],
}

#[derive(Debug, Clone, PartialEq)]
pub struct OverlayScene {
    pub view_box: Dimensions,
    pub layers: Vec<PairLayer>,
}

pub struct OverlayRenderer;

impl OverlayRenderer {
    /// Empty dimensions produce an empty scene.
    pub fn render(pairs: &[SockPair], dims: Dimensions) -> OverlayScene {
        if dims.is_empty() {
            return OverlayScene {
                view_box: Dimensions::ZERO,
                layers: Vec::new(),
            };
        }

        let layers = pairs
            .iter()
            .enumerate()
            .map(|(index, pair)| {
                let box1 = scale_box(&pair.box1, dims);
                let box2 = scale_box(&pair.box2, dims);
                let center1 = center(&box1);
                let center2 = center(&box2);
                let label = (index + 1).to_string();
                PairLayer {
                    index,
                    color: pair.highlight_color.clone(),
                    connector: Connector {
                        from: center1,
                        to: center2,
                    },
                    boxes: [BoxShape { bounds: box1 }, BoxShape { bounds: box2 }],
                    markers: [
                        Marker {
                            at: center1,
                            label: label.clone(),
                        },
                        Marker { at: center2, label },
                    ],
                }
            })
            .collect();

        OverlayScene {
            view_box: dims,
            layers,
        }
    }
}

impl OverlayScene {
    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    pub fn line_count(&self) -> usize {
        self.layers.len()
    }

    pub fn rect_count(&self) -> usize {
        self.layers.iter().map(|l| l.boxes.len()).sum()
    }

    pub fn marker_count(&self) -> usize {
        self.layers.iter().map(|l| l.markers.len()).sum()
    }

    /// Marker labels in draw order.
    pub fn marker_labels(&self) -> Vec<&str> {
        self.layers
            .iter()
            .flat_map(|l| l.markers.iter().map(|m| m.label.as_str()))
            .collect()
    }

    /// Serializes the scene as a non-interactive SVG layer. An empty scene
    /// yields an empty string.
    pub fn to_svg(&self) -> String {
        if self.is_empty() {
            return String::new();
        }
        let mut out = String::new();
        let _ = writeln!(
            out,
            r#"<svg xmlns="http://www.w3.org/2000/svg" class="sock-pair-overlay" viewBox="0 0 {} {}" pointer-events="none" style="position:absolute;top:0;left:0;width:100%;height:100%;pointer-events:none">"#,
            num(self.view_box.width),
            num(self.view_box.height)
        );
        let _ = writeln!(
            out,
            "<style>@keyframes dash {{ to {{ stroke-dashoffset: -100; }} }} .connector {{ animation: {}; }}</style>",
            CONNECTOR_ANIMATION
        );
        for layer in &self.layers {
            write_layer(&mut out, layer);
        }
        out.push_str("</svg>\n");
        out
    }
}

fn write_layer(out: &mut String, layer: &PairLayer) {
    let color = escape_xml(&layer.color);
    let _ = writeln!(out, r#"<g data-pair="{}">"#, layer.index + 1);
    let _ = writeln!(
        out,
        r#"<line class="connector" x1="{}" y1="{}" x2="{}" y2="{}" stroke="{}" stroke-width="{}" stroke-dasharray="{}"/>"#,
        num(layer.connector.from.x),
        num(layer.connector.from.y),
        num(layer.connector.to.x),
        num(layer.connector.to.y),
        color,
        num(CONNECTOR_STROKE_WIDTH),
        CONNECTOR_DASH
    );
    // Each marker follows its own box so the box fill never covers it.
    for (shape, marker) in layer.boxes.iter().zip(layer.markers.iter()) {
        let b = &shape.bounds;
        let _ = writeln!(
            out,
            r#"<rect x="{}" y="{}" width="{}" height="{}" fill="{}" fill-opacity="{}" stroke="{}" stroke-width="{}" rx="{}"/>"#,
            num(b.x1),
            num(b.y1),
            num(b.width().max(0.0)),
            num(b.height().max(0.0)),
            color,
            num(BOX_FILL_OPACITY),
            color,
            num(BOX_STROKE_WIDTH),
            num(BOX_CORNER_RADIUS)
        );
        let _ = writeln!(
            out,
            r#"<circle cx="{}" cy="{}" r="{}" fill="{}"/>"#,
            num(marker.at.x),
            num(marker.at.y),
            num(MARKER_RADIUS),
            color
        );
        let _ = writeln!(
            out,
            r#"<text x="{}" y="{}" text-anchor="middle" dy=".3em" fill="{}" font-size="{}" font-weight="bold">{}</text>"#,
            num(marker.at.x),
            num(marker.at.y),
            MARKER_TEXT_COLOR,
            num(MARKER_FONT_SIZE),
            escape_xml(&marker.label)
        );
    }
    out.push_str("</g>\n");
}

/// A standalone document with the photo underneath its overlay.
pub fn compose_annotated_svg(image: &ImageData, dims: Dimensions, scene: &OverlayScene) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#,
        w = num(dims.width),
        h = num(dims.height)
    );
    let _ = writeln!(
        out,
        r#"<image href="{}" x="0" y="0" width="{}" height="{}" preserveAspectRatio="none"/>"#,
        escape_xml(&image.to_data_uri()),
        num(dims.width),
        num(dims.height)
    );
    out.push_str(&scene.to_svg());
    out.push_str("</svg>\n");
    out
}

/// Non-finite values (from absurd service input) collapse to 0.
fn num(v: f64) -> String {
    if !v.is_finite() {
        return "0".to_string();
    }
    let rounded = (v * 100.0).round() / 100.0;
    if rounded == rounded.trunc() {
        format!("{}", rounded as i64)
    } else {
        format!("{}", rounded)
    }
}

fn escape_xml(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c => out.push(c),
        }
    }
    out
}
