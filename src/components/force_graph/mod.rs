//! Browser binding: canvas engine, renderer, timers and the panel component.

mod component;
mod render;
mod state;
mod timers;

pub use component::GraphPanel;
pub use state::{EdgeInfo, ForceGraphEngine, HoverEvent, NodeInfo};
pub use timers::BrowserScheduler;
