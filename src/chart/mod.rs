pub mod figure;
pub mod render;

pub use figure::{ChartKind, ChartStyle, Figure, Trace};
