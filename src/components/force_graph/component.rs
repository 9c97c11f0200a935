use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use leptos::prelude::*;
use log::{error, warn};
use wasm_bindgen::prelude::*;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, MouseEvent, WheelEvent};

use super::render;
use super::state::{ForceGraphEngine, HoverEvent};
use super::timers::{BrowserScheduler, TimerCallback};
use crate::bridge::VsCodeBridge;
use crate::config::PanelConfig;
use crate::graph::NetworkData;
use crate::layout::Point;
use crate::session::GraphSession;
use crate::session::timers::TimerKey;

type Session = GraphSession<ForceGraphEngine, BrowserScheduler>;
type SharedSession = Rc<RefCell<Option<Session>>>;

const FRAME_SECONDS: f32 = 0.016;

fn container_size(canvas: &HtmlCanvasElement) -> (f64, f64) {
	let parent = canvas.parent_element();
	(
		parent.as_ref().map(|p| p.client_width() as f64).unwrap_or(800.0),
		parent.as_ref().map(|p| p.client_height() as f64).unwrap_or(600.0),
	)
}

fn context_2d(canvas: &HtmlCanvasElement) -> Option<CanvasRenderingContext2d> {
	canvas.get_context("2d").ok().flatten()?.dyn_into().ok()
}

fn pointer(canvas_ref: NodeRef<leptos::html::Canvas>, ev: &MouseEvent) -> Option<Point> {
	let canvas: HtmlCanvasElement = canvas_ref.get()?.into();
	let rect = canvas.get_bounding_client_rect();
	Some(Point::new(
		ev.client_x() as f64 - rect.left(),
		ev.client_y() as f64 - rect.top(),
	))
}

fn timer_callback(session: Weak<RefCell<Option<Session>>>) -> Rc<TimerCallback> {
	Rc::new(Closure::new(move |code: u32| {
		let Some(key) = TimerKey::from_code(code) else {
			warn!("unknown timer code {code}");
			return;
		};
		let Some(session) = session.upgrade() else {
			return;
		};
		if let Some(s) = session.borrow_mut().as_mut() {
			s.on_timer(key);
		}
	}))
}

/// Canvas view of one network with hover controls and the apply button.
///
/// The session is rebuilt from scratch whenever `data` changes; `None`
/// clears it.
#[component]
pub fn GraphPanel(#[prop(into)] data: Signal<Option<NetworkData>>, config: PanelConfig) -> impl IntoView {
	let canvas_ref = NodeRef::<leptos::html::Canvas>::new();
	let session: SharedSession = Rc::new(RefCell::new(None));
	let dirty = RwSignal::new(false);
	let over_controls = Rc::new(Cell::new(false));
	let on_timer = timer_callback(Rc::downgrade(&session));
	let animate: Rc<RefCell<Option<Closure<dyn FnMut()>>>> = Rc::new(RefCell::new(None));
	let resize_cb: Rc<RefCell<Option<Closure<dyn FnMut()>>>> = Rc::new(RefCell::new(None));
	let (session_init, animate_init, resize_cb_init) =
		(session.clone(), animate.clone(), resize_cb.clone());

	Effect::new(move |_| {
		let network = data.get();
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		let canvas: HtmlCanvasElement = canvas.into();
		let (w, h) = container_size(&canvas);
		canvas.set_width(w as u32);
		canvas.set_height(h as u32);

		let rebuilt = network.map(|network| {
			let engine = ForceGraphEngine::new(&network, w, h);
			let timers = BrowserScheduler::new(on_timer.clone());
			GraphSession::new(network, engine, timers, config.clone())
		});
		// The old session's timers are cleared when it drops.
		*session_init.borrow_mut() = rebuilt;
		dirty.set(false);

		if animate_init.borrow().is_some() {
			return;
		}
		let Some(window) = web_sys::window() else {
			return;
		};
		let Some(ctx) = context_2d(&canvas) else {
			error!("canvas 2d context unavailable");
			return;
		};

		let (session_resize, canvas_resize) = (session_init.clone(), canvas.clone());
		*resize_cb_init.borrow_mut() = Some(Closure::new(move || {
			let (nw, nh) = container_size(&canvas_resize);
			canvas_resize.set_width(nw as u32);
			canvas_resize.set_height(nh as u32);
			if let Some(s) = session_resize.borrow_mut().as_mut() {
				s.engine_mut().resize(nw, nh);
				s.on_resize();
			}
		}));
		if let Some(ref cb) = *resize_cb_init.borrow() {
			if let Err(e) = window.add_event_listener_with_callback("resize", cb.as_ref().unchecked_ref()) {
				warn!("failed to listen for resize: {:?}", e);
			}
		}

		let (session_anim, animate_inner) = (session_init.clone(), animate_init.clone());
		*animate_init.borrow_mut() = Some(Closure::new(move || {
			if let Some(s) = session_anim.borrow_mut().as_mut() {
				if s.engine_mut().tick(FRAME_SECONDS) {
					s.on_stabilized();
				}
				s.on_after_drawing();
				render::render(s.engine(), s.overlay().active_node(), s.controls(), &ctx);
			}
			if let (Some(cb), Some(win)) = (animate_inner.borrow().as_ref(), web_sys::window()) {
				let _ = win.request_animation_frame(cb.as_ref().unchecked_ref());
			}
		}));
		if let Some(ref cb) = *animate_init.borrow() {
			let _ = window.request_animation_frame(cb.as_ref().unchecked_ref());
		}
	});

	let session_md = session.clone();
	let on_mousedown = move |ev: MouseEvent| {
		let Some(p) = pointer(canvas_ref, &ev) else {
			return;
		};
		if let Some(s) = session_md.borrow_mut().as_mut() {
			if !s.click(p) {
				s.engine_mut().press(p.x, p.y);
			}
			dirty.set(s.is_dirty());
		}
	};

	let (session_mm, over_controls_mm) = (session.clone(), over_controls.clone());
	let on_mousemove = move |ev: MouseEvent| {
		let Some(p) = pointer(canvas_ref, &ev) else {
			return;
		};
		let mut guard = session_mm.borrow_mut();
		let Some(s) = guard.as_mut() else {
			return;
		};
		if s.engine().is_dragging() {
			if s.engine_mut().drag_to(p.x, p.y) {
				s.on_view_changed();
			}
			return;
		}

		let on_controls = s.controls().is_some_and(|v| v.contains(p));
		if on_controls != over_controls_mm.get() {
			over_controls_mm.set(on_controls);
			if on_controls {
				s.on_controls_enter();
			} else {
				s.on_controls_leave();
			}
		}
		if !on_controls {
			match s.engine_mut().pointer_moved(p.x, p.y) {
				Some(HoverEvent::Enter(id)) => s.on_hover_node(id),
				Some(HoverEvent::Leave) => s.on_blur_node(),
				None => {}
			}
			let under = s.engine().hovered();
			s.on_pointer_over(under);
		}

		let title = s
			.controls()
			.and_then(|v| v.button_at(p))
			.map(|b| b.description.clone())
			.or_else(|| s.engine().hovered_title())
			.unwrap_or_default();
		if let Some(canvas) = canvas_ref.get() {
			let canvas: HtmlCanvasElement = canvas.into();
			canvas.set_title(&title);
		}
	};

	let session_mu = session.clone();
	let on_mouseup = move |_: MouseEvent| {
		if let Some(s) = session_mu.borrow_mut().as_mut() {
			s.engine_mut().release();
		}
	};

	let (session_ml, over_controls_ml) = (session.clone(), over_controls.clone());
	let on_mouseleave = move |_: MouseEvent| {
		if let Some(s) = session_ml.borrow_mut().as_mut() {
			if over_controls_ml.replace(false) {
				s.on_controls_leave();
			}
			if s.engine_mut().pointer_left() == Some(HoverEvent::Leave) {
				s.on_blur_node();
			}
		}
	};

	let session_wh = session.clone();
	let on_wheel = move |ev: WheelEvent| {
		ev.prevent_default();
		let Some(p) = pointer(canvas_ref, &ev) else {
			return;
		};
		if let Some(s) = session_wh.borrow_mut().as_mut() {
			s.engine_mut().zoom_at(p.x, p.y, ev.delta_y());
			s.on_view_changed();
		}
	};

	let session_apply = session.clone();
	let on_apply = move |_: MouseEvent| {
		if let Some(s) = session_apply.borrow_mut().as_mut() {
			if let Err(e) = s.apply(&VsCodeBridge) {
				error!("failed to apply changes: {e}");
			}
			dirty.set(s.is_dirty());
		}
	};

	view! {
		<div class="graph-panel">
			<canvas
				node_ref=canvas_ref
				class="force-graph-canvas"
				on:mousedown=on_mousedown
				on:mousemove=on_mousemove
				on:mouseup=on_mouseup
				on:mouseleave=on_mouseleave
				on:wheel=on_wheel
				style="display: block; cursor: grab;"
			/>
			<button
				class="apply-button"
				style:display=move || if dirty.get() { "block" } else { "none" }
				on:click=on_apply
			>
				"Apply Changes"
			</button>
		</div>
	}
}
