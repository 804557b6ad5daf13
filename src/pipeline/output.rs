//! What one pipeline pass produces

use super::selection::Selection;
use crate::chart::TrendChart;
use crate::currency::{format_rate_line, CurrencyCode};
use crate::error::{DashboardError, ErrorKind};
use crate::logger::AppendReport;
use std::fmt;
use std::path::PathBuf;

/// Pipeline state machine
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum PipelineState {
    #[default]
    Idle,
    FetchingUniverse,
    AwaitingSelection,
    FetchingRates,
    Logging,
    ReadingHistory,
    Rendering,
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            PipelineState::Idle => "idle",
            PipelineState::FetchingUniverse => "fetching currencies",
            PipelineState::AwaitingSelection => "awaiting selection",
            PipelineState::FetchingRates => "fetching rates",
            PipelineState::Logging => "logging",
            PipelineState::ReadingHistory => "reading history",
            PipelineState::Rendering => "rendering",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum NoticeLevel {
    Info,
    Warning,
    Error,
}

/// User-facing message raised during a pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub kind: Option<ErrorKind>,
    pub message: String,
}

impl Notice {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            kind: None,
            message: message.into(),
        }
    }

    pub fn warning(kind: Option<ErrorKind>, message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Warning,
            kind,
            message: message.into(),
        }
    }

    pub fn error(kind: Option<ErrorKind>, message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            kind,
            message: message.into(),
        }
    }

    /// Notice for a caught error, prefixed with `context`
    pub fn from_error(level: NoticeLevel, context: &str, err: &DashboardError) -> Self {
        Self {
            level,
            kind: Some(err.kind()),
            message: format!("{}: {}", context, err),
        }
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// One displayed rate
#[derive(Debug, Clone, PartialEq)]
pub struct RateLine {
    pub base: CurrencyCode,
    pub target: CurrencyCode,
    pub rate: f64,
}

impl fmt::Display for RateLine {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&format_rate_line(&self.base, &self.target, self.rate))
    }
}

/// A chart and where it was saved, if anywhere
#[derive(Debug, Clone)]
pub struct RenderedTrend {
    pub chart: TrendChart,
    pub path: Option<PathBuf>,
}

/// Outcome of one pass
#[derive(Debug, Clone, Default)]
pub struct RenderOutput {
    /// Resolved selection; `None` when the universe could not be loaded
    pub selection: Option<Selection>,
    pub rates: Vec<RateLine>,
    pub notices: Vec<Notice>,
    pub charts: Vec<RenderedTrend>,
    pub append: Option<AppendReport>,
    /// States entered, in order
    pub trace: Vec<PipelineState>,
    /// Last working state; `Idle` only when nothing ran
    pub stopped_at: PipelineState,
    /// True when the pass got through rendering
    pub completed: bool,
}

impl RenderOutput {
    /// Display lines, one per valid rate
    pub fn lines(&self) -> Vec<String> {
        self.rates.iter().map(ToString::to_string).collect()
    }

    pub fn notices_at(&self, level: NoticeLevel) -> impl Iterator<Item = &Notice> {
        self.notices.iter().filter(move |n| n.level == level)
    }

    pub fn has_errors(&self) -> bool {
        self.notices_at(NoticeLevel::Error).next().is_some()
    }

    /// Whether a notice of this kind was raised
    pub fn has_kind(&self, kind: ErrorKind) -> bool {
        self.notices.iter().any(|n| n.kind == Some(kind))
    }

    pub fn visited(&self, state: PipelineState) -> bool {
        self.trace.contains(&state)
    }

    pub(crate) fn enter(&mut self, state: PipelineState) {
        log::debug!("Pipeline: {}", state);
        self.trace.push(state);
        self.stopped_at = state;
    }

    /// Record a notice for the caller to present
    ///
    /// Notices reach users through `notices`; the log only traces them.
    pub(crate) fn notify(&mut self, notice: Notice) {
        log::debug!("{:?} notice: {}", notice.level, notice);
        self.notices.push(notice);
    }
}
