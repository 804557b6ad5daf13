//! Render pipeline: universe, selection, rates, log, history, charts

pub mod dashboard;
pub mod output;
pub mod selection;

pub use dashboard::Dashboard;
pub use output::{Notice, NoticeLevel, PipelineState, RateLine, RenderOutput, RenderedTrend};
pub use selection::{DashboardEvent, Selection, SelectionPolicy, SelectionRequest};
