//! Post-processing of generated text into mind maps.
//!
//! [`aggregate`] stitches per-chunk generations back together, and the
//! structurers turn the result into either a nested [`MindmapNode`] tree or a
//! leveled Markdown document.

pub mod aggregate;
pub mod line;
pub mod markdown;
pub mod tree;

pub use aggregate::{aggregate, AggregateOptions};
pub use line::{classify, Line, LineKind};
pub use markdown::render_markdown;
pub use tree::{build_tree, DroppedLine, MindmapNode, Structured};

/// Title of the root node when the caller supplies none.
pub const DEFAULT_ROOT_TITLE: &str = "Main Topic";
