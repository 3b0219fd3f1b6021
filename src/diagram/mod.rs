//! Diagram validation and preview.
//!
//! - `lint` — cheap header check before anything is rendered
//! - `render` — the `Renderer` seam and the mermaid CLI implementation
//! - `preview` — debounced per-source render state machine
//! - `registry` — one preview per mermaid card, plus the live helper

pub mod lint;
pub mod preview;
pub mod registry;
pub mod render;

pub use lint::DiagramLinter;
pub use preview::{DEBOUNCE, DiagramPreview, Phase, PreviewSnapshot};
pub use registry::{DEFAULT_DIAGRAM, DiagramHelper, PreviewRegistry};
pub use render::{CommandRenderer, Renderer};
