//! Charts module - Static chart rendering

mod renderer;

pub use renderer::{ChartJob, ChartKind, RenderError, StaticChartRenderer};
