//! Audio runtime — the small pull-based node model everything renders through.
//!
//! Nodes are pulled one [`AudioBlock`] at a time. Sources mix into the block,
//! effects rewrite it in place. The same nodes run inside an
//! [`OfflineContext`] for prerendering and inside the realtime engine callback.

pub mod buffer_source;
pub mod node;
pub mod offline;
pub mod volume;

pub use buffer_source::{BufferSource, BufferSourceOptions, FadeCurve};
pub use node::{AudioBlock, AudioNode, NodeFactory};
pub use offline::{OfflineContext, RenderSource, RENDER_QUANTUM};
pub use volume::Volume;
