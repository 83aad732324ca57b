pub mod canvas;
pub use canvas::{PdfCanvas, RenderedPdf};
pub mod metrics;
pub use metrics::Font;
pub mod signature;
pub mod wrap;
