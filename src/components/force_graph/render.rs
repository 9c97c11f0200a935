use std::f64::consts::PI;

use web_sys::CanvasRenderingContext2d;

use super::state::ForceGraphEngine;
use crate::graph::NodeId;
use crate::layout::{EdgeStyle, LayoutEngine, NodeStyle};
use crate::session::overlay::{ControlAction, OverlayView};

const BACKGROUND: &str = "#1a1a2e";

struct Palette {
	fill: &'static str,
	border: &'static str,
	font: &'static str,
}

fn palette(style: NodeStyle) -> Palette {
	match style {
		NodeStyle::Default => Palette {
			fill: "#97c2fc",
			border: "#2b7ce9",
			font: "#ffffff",
		},
		NodeStyle::Conclusion => Palette {
			fill: "#e91ea2",
			border: "#d6266d",
			font: "#ffffff",
		},
		NodeStyle::Removed => Palette {
			fill: "#f2f2f2",
			border: "#bbbbbb",
			font: "#999999",
		},
		NodeStyle::Isolated => Palette {
			fill: "#f0f8ff",
			border: "#87ceeb",
			font: "#ffffff",
		},
	}
}

fn edge_color(style: EdgeStyle) -> &'static str {
	match style {
		EdgeStyle::Default => "rgba(255, 255, 255, 0.8)",
		EdgeStyle::Muted => "#cccccc",
	}
}

pub fn render(
	engine: &ForceGraphEngine,
	active: Option<NodeId>,
	controls: Option<&OverlayView>,
	ctx: &CanvasRenderingContext2d,
) {
	ctx.set_fill_style_str(BACKGROUND);
	ctx.fill_rect(0.0, 0.0, engine.width, engine.height);
	ctx.save();
	let _ = ctx.translate(engine.transform.x, engine.transform.y);
	let _ = ctx.scale(engine.transform.k, engine.transform.k);
	draw_edges(engine, ctx);
	draw_nodes(engine, active, ctx);
	ctx.restore();
	if let Some(view) = controls {
		draw_controls(view, ctx);
	}
}

fn draw_edges(engine: &ForceGraphEngine, ctx: &CanvasRenderingContext2d) {
	let k = engine.transform.k;
	let positions = engine.positions();
	let mut sizes = std::collections::HashMap::new();
	engine.graph.visit_nodes(|node| {
		sizes.insert(node.data.user_data.id, node.data.user_data.size);
	});
	let (line_width, arrow_size) = (1.0 / k.max(0.5), 6.0);

	for edge in engine.edges() {
		let (Some(from), Some(to)) = (positions.get(&edge.from), positions.get(&edge.to)) else {
			continue;
		};
		let (dx, dy) = (to.x - from.x, to.y - from.y);
		let dist = (dx * dx + dy * dy).sqrt();
		if dist < 0.001 {
			continue;
		}
		let (ux, uy) = (dx / dist, dy / dist);
		let from_r = sizes.get(&edge.from).copied().unwrap_or(0.0) / 2.0;
		let to_r = sizes.get(&edge.to).copied().unwrap_or(0.0) / 2.0;
		let color = edge_color(edge.style);

		ctx.set_stroke_style_str(color);
		ctx.set_line_width(line_width);
		ctx.begin_path();
		ctx.move_to(from.x + ux * from_r, from.y + uy * from_r);
		ctx.line_to(to.x - ux * (to_r + arrow_size), to.y - uy * (to_r + arrow_size));
		ctx.stroke();

		ctx.set_fill_style_str(color);
		let (tip_x, tip_y) = (to.x - ux * to_r, to.y - uy * to_r);
		let (back_x, back_y) = (tip_x - ux * arrow_size, tip_y - uy * arrow_size);
		let (px, py) = (-uy * arrow_size * 0.5, ux * arrow_size * 0.5);
		ctx.begin_path();
		ctx.move_to(tip_x, tip_y);
		ctx.line_to(back_x + px, back_y + py);
		ctx.line_to(back_x - px, back_y - py);
		ctx.close_path();
		ctx.fill();
	}
}

fn draw_nodes(engine: &ForceGraphEngine, active: Option<NodeId>, ctx: &CanvasRenderingContext2d) {
	let k = engine.transform.k;
	ctx.set_text_align("center");
	ctx.set_text_baseline("top");
	engine.graph.visit_nodes(|node| {
		let info = &node.data.user_data;
		let (x, y) = (node.x() as f64, node.y() as f64);
		let hovered = active == Some(info.id);
		let radius = if hovered { info.size * 0.55 } else { info.size / 2.0 };
		let colors = palette(info.style);

		ctx.begin_path();
		let _ = ctx.arc(x, y, radius, 0.0, 2.0 * PI);
		ctx.set_fill_style_str(colors.fill);
		ctx.fill();
		ctx.set_stroke_style_str(colors.border);
		let border = if hovered { 3.0 } else { 1.0 };
		ctx.set_line_width(border / k.max(0.5));
		ctx.stroke();

		ctx.set_fill_style_str(colors.font);
		ctx.set_font(&format!("{}px arial", 13.0 / k.max(0.5)));
		let _ = ctx.fill_text(&info.label, x, y + radius + 4.0);
	});
}

/// Controls live in container pixels, on top of the transformed canvas.
fn draw_controls(view: &OverlayView, ctx: &CanvasRenderingContext2d) {
	ctx.set_text_align("center");
	ctx.set_text_baseline("middle");
	ctx.set_font(&format!("{}px sans-serif", view.geometry.font_size));
	for button in &view.buttons {
		let rect = button.rect;
		let center = rect.center();
		let fill = match button.action {
			ControlAction::Remove => "#d9534f",
			_ => "rgba(30, 30, 46, 0.9)",
		};
		ctx.set_global_alpha(if button.enabled { 1.0 } else { 0.4 });
		ctx.begin_path();
		let _ = ctx.arc(center.x, center.y, rect.width / 2.0, 0.0, 2.0 * PI);
		ctx.set_fill_style_str(fill);
		ctx.fill();
		ctx.set_stroke_style_str("rgba(255, 255, 255, 0.8)");
		ctx.set_line_width(1.0);
		ctx.stroke();
		ctx.set_fill_style_str("white");
		let _ = ctx.fill_text(button.action.glyph(), center.x, center.y);
	}
	ctx.set_global_alpha(1.0);
}
