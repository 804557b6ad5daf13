//! Dashboard orchestrator
//!
//! Runs one pass of fetch, validate, log, replay and chart. Every failure is
//! caught where it happens and turned into a notice; a pass never returns an
//! error to the caller.

use super::output::{Notice, NoticeLevel, PipelineState, RateLine, RenderOutput, RenderedTrend};
use super::selection::{DashboardEvent, Selection, SelectionPolicy, SelectionRequest};
use crate::cache::SessionCache;
use crate::chart::TrendRenderer;
use crate::config::DashboardConfig;
use crate::currency::CurrencyCode;
use crate::error::{DashboardError, ErrorKind, Result};
use crate::history::{HistoryRead, HistoryReader};
use crate::logger::ObservationLogger;
use crate::sheet::SheetConnector;
use crate::sources::RateSource;
use std::collections::BTreeSet;
use std::path::PathBuf;

/// Orchestrates render passes for one session
///
/// Owns the session caches: the currency universe and the worksheet handle.
/// Both are filled on first successful use and kept until invalidated.
pub struct Dashboard<S: RateSource, C: SheetConnector> {
    source: S,
    connector: C,
    logger: ObservationLogger,
    reader: HistoryReader,
    renderer: TrendRenderer,
    policy: SelectionPolicy,
    chart_dir: Option<PathBuf>,
    universe: SessionCache<BTreeSet<CurrencyCode>>,
    sheet: SessionCache<C::Sheet>,
    request: SelectionRequest,
    state: PipelineState,
}

impl<S: RateSource, C: SheetConnector> Dashboard<S, C> {
    pub fn new(source: S, connector: C, policy: SelectionPolicy) -> Self {
        Self {
            source,
            connector,
            logger: ObservationLogger::default(),
            reader: HistoryReader::new(),
            renderer: TrendRenderer::default(),
            policy,
            chart_dir: None,
            universe: SessionCache::new(),
            sheet: SessionCache::new(),
            request: SelectionRequest::default(),
            state: PipelineState::Idle,
        }
    }

    /// Build from configuration: clock, chart size, chart directory and limits
    pub fn from_config(source: S, connector: C, config: &DashboardConfig) -> Result<Self> {
        Ok(Self::new(source, connector, SelectionPolicy::from_config(config)?)
            .with_logger(ObservationLogger::new(config.log_clock()?))
            .with_renderer(TrendRenderer::new(config.chart_width, config.chart_height))
            .with_chart_dir(config.chart_dir.clone()))
    }

    pub fn with_logger(mut self, logger: ObservationLogger) -> Self {
        self.logger = logger;
        self
    }

    pub fn with_renderer(mut self, renderer: TrendRenderer) -> Self {
        self.renderer = renderer;
        self
    }

    /// Save every rendered chart as SVG under `dir`
    pub fn with_chart_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.chart_dir = Some(dir.into());
        self
    }

    /// Render charts without saving them
    pub fn without_chart_dir(mut self) -> Self {
        self.chart_dir = None;
        self
    }

    pub fn with_request(mut self, request: SelectionRequest) -> Self {
        self.request = request;
        self
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    /// Selection request the next pass will use
    pub fn request(&self) -> &SelectionRequest {
        &self.request
    }

    /// Drop the cached universe and worksheet handle
    pub fn invalidate_caches(&mut self) {
        self.universe.invalidate();
        self.sheet.invalidate();
        log::info!("Session caches invalidated");
    }

    /// Currency universe, served from the session cache after the first success
    pub async fn universe(&mut self) -> Result<BTreeSet<CurrencyCode>> {
        if let Some(universe) = self.universe.get() {
            return Ok(universe.clone());
        }

        let universe = self.source.supported_currencies().await?;
        if universe.is_empty() {
            return Err(DashboardError::EmptyUniverse);
        }
        log::info!(
            "Loaded {} currencies from {}",
            universe.len(),
            self.source.name()
        );
        Ok(self.universe.set(universe).clone())
    }

    /// Read the whole log through the cached worksheet handle
    pub fn history(&mut self) -> Result<HistoryRead> {
        let connector = &self.connector;
        let sheet = self.sheet.get_or_try_init(|| connector.connect())?;
        self.reader.read_all(sheet)
    }

    /// Apply a control event and run one pass
    pub async fn handle(&mut self, event: DashboardEvent) -> RenderOutput {
        if event == DashboardEvent::InvalidateCaches {
            self.invalidate_caches();
        }
        self.request.apply(&event);
        let request = self.request.clone();
        self.run(&request).await
    }

    /// Run one pass for `request`
    ///
    /// On success the resolved selection becomes the pending request, so
    /// later events edit what was actually shown.
    pub async fn run(&mut self, request: &SelectionRequest) -> RenderOutput {
        let mut output = RenderOutput::default();
        self.pass(request, &mut output).await;
        if let Some(selection) = &output.selection {
            self.request = selection.to_request();
        }
        self.state = PipelineState::Idle;
        output
    }

    fn enter(&mut self, state: PipelineState, output: &mut RenderOutput) {
        self.state = state;
        output.enter(state);
    }

    async fn pass(&mut self, request: &SelectionRequest, output: &mut RenderOutput) {
        self.enter(PipelineState::FetchingUniverse, output);
        let universe = match self.universe().await {
            Ok(universe) => universe,
            Err(e) => {
                output.notify(Notice::from_error(
                    NoticeLevel::Error,
                    "No currencies available; check the API key or network connection",
                    &e,
                ));
                return;
            }
        };

        self.enter(PipelineState::AwaitingSelection, output);
        let Some((selection, notices)) = self.policy.resolve(&universe, request) else {
            output.notify(Notice::error(
                Some(ErrorKind::EmptyUniverse),
                DashboardError::EmptyUniverse.to_string(),
            ));
            return;
        };
        for notice in notices {
            output.notify(notice);
        }
        output.selection = Some(selection.clone());
        if selection.targets.is_empty() {
            output.notify(Notice::info(
                "Please select at least one currency to display.",
            ));
            return;
        }

        self.enter(PipelineState::FetchingRates, output);
        let snapshot = match self.source.latest_rates(&selection.base).await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                output.notify(Notice::from_error(
                    NoticeLevel::Error,
                    "Failed to fetch exchange rates",
                    &e,
                ));
                return;
            }
        };

        for target in &selection.targets {
            match snapshot.valid_rate(target) {
                Some(rate) => output.rates.push(RateLine {
                    base: selection.base.clone(),
                    target: target.clone(),
                    rate,
                }),
                None => output.notify(Notice::from_error(
                    NoticeLevel::Warning,
                    "Skipping",
                    &DashboardError::NoValidRate(format!("{}/{}", selection.base, target)),
                )),
            }
        }

        self.enter(PipelineState::Logging, output);
        let connector = &self.connector;
        let logged = self
            .sheet
            .get_or_try_init(|| connector.connect())
            .map_err(|e| DashboardError::LogWriteFailed(e.to_string()))
            .and_then(|sheet| {
                self.logger
                    .append(sheet, &selection.base, &selection.targets, &snapshot)
            });
        match logged {
            Ok(report) => output.append = Some(report),
            Err(e) => {
                output.notify(Notice::from_error(
                    NoticeLevel::Error,
                    "Failed to log rates",
                    &e,
                ));
                return;
            }
        }

        self.enter(PipelineState::ReadingHistory, output);
        let history = match self.history() {
            Ok(history) => history,
            Err(e @ DashboardError::LogSchemaMismatch { .. }) => {
                output.notify(Notice::from_error(
                    NoticeLevel::Warning,
                    "Cannot chart trends",
                    &e,
                ));
                return;
            }
            Err(e) => {
                output.notify(Notice::from_error(
                    NoticeLevel::Warning,
                    "Could not load trend data",
                    &e,
                ));
                return;
            }
        };
        if history.skipped_rows > 0 {
            output.notify(Notice::warning(
                None,
                format!("Ignored {} malformed log row(s)", history.skipped_rows),
            ));
        }
        if history.is_empty() {
            output.notify(Notice::info("No historical data logged yet."));
            return;
        }

        self.enter(PipelineState::Rendering, output);
        self.render_charts(&selection, &history, output);
        output.completed = true;
    }

    fn render_charts(
        &self,
        selection: &Selection,
        history: &HistoryRead,
        output: &mut RenderOutput,
    ) {
        for target in &selection.targets {
            let chart = match self
                .renderer
                .render(&history.records, &selection.base, target)
            {
                Ok(chart) => chart,
                Err(e) => {
                    output.notify(Notice::from_error(
                        NoticeLevel::Warning,
                        &format!("Could not chart {}", target),
                        &e,
                    ));
                    continue;
                }
            };

            let path = match &self.chart_dir {
                Some(dir) => match chart.write_to_dir(dir) {
                    Ok(path) => Some(path),
                    Err(e) => {
                        output.notify(Notice::from_error(
                            NoticeLevel::Warning,
                            &format!("Could not save {}", chart.file_name()),
                            &e,
                        ));
                        None
                    }
                },
                None => None,
            };
            output.charts.push(RenderedTrend { chart, path });
        }
    }
}
