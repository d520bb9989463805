pub mod calc;
pub mod context;
pub mod format;

pub use context::{DocumentType, LineView, RenderContext, TotalsView};
