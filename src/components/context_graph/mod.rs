//! Analysis-pipeline context graph: trace normalization, risk/drift
//! classification, stage filtering, layout, and the interactive canvas.

mod classify;
mod component;
mod fields;
mod layout;
mod render;
mod state;
mod trace;
mod types;

pub use classify::classify;
pub use component::ContextGraphCanvas;
pub use layout::{ForceDirectedLayout, GridLayout, LayoutError, LayoutProvider, Point, compute_layout};
pub use trace::normalize;
pub use types::{Drift, Edge, Graph, Node, RiskLevel, Stage};
