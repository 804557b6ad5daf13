//! Selection requests and their resolution against the currency universe

use super::output::Notice;
use crate::config::DashboardConfig;
use crate::currency::CurrencyCode;
use crate::error::{ErrorKind, Result};
use std::collections::BTreeSet;

/// What the user asked for
///
/// `targets: None` means "use the defaults"; `Some(vec![])` is an explicit
/// empty selection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionRequest {
    pub base: Option<CurrencyCode>,
    pub targets: Option<Vec<CurrencyCode>>,
}

impl SelectionRequest {
    pub fn new(base: Option<CurrencyCode>, targets: Option<Vec<CurrencyCode>>) -> Self {
        Self { base, targets }
    }

    /// Apply a control event to the pending request
    ///
    /// Returns false for events that leave the request untouched.
    pub fn apply(&mut self, event: &DashboardEvent) -> bool {
        match event {
            DashboardEvent::SetBase(code) => {
                self.base = Some(code.clone());
                true
            }
            DashboardEvent::AddTarget(code) => {
                let targets = self.targets.get_or_insert_with(Vec::new);
                if targets.contains(code) {
                    return false;
                }
                targets.push(code.clone());
                true
            }
            DashboardEvent::RemoveTarget(code) => {
                let targets = self.targets.get_or_insert_with(Vec::new);
                let before = targets.len();
                targets.retain(|t| t != code);
                targets.len() != before
            }
            DashboardEvent::ClearTargets => {
                self.targets = Some(Vec::new());
                true
            }
            DashboardEvent::Refresh | DashboardEvent::InvalidateCaches => false,
        }
    }
}

/// Control events driving the interactive loop
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DashboardEvent {
    /// Re-run with the current selection
    Refresh,
    SetBase(CurrencyCode),
    AddTarget(CurrencyCode),
    RemoveTarget(CurrencyCode),
    ClearTargets,
    /// Drop the cached universe and worksheet handle, then re-run
    InvalidateCaches,
}

/// Resolved `(base, targets)` for one pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub base: CurrencyCode,
    pub targets: Vec<CurrencyCode>,
}

impl Selection {
    /// The request that reproduces this selection
    pub fn to_request(&self) -> SelectionRequest {
        SelectionRequest::new(Some(self.base.clone()), Some(self.targets.clone()))
    }
}

/// Defaults and limits applied when resolving a request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionPolicy {
    pub default_base: CurrencyCode,
    pub preferred_targets: Vec<CurrencyCode>,
    pub max_targets: usize,
    pub default_target_cap: usize,
}

impl SelectionPolicy {
    /// Policy with the stock limits: 15 targets, 10 pre-selected
    pub fn new(default_base: CurrencyCode, preferred_targets: Vec<CurrencyCode>) -> Self {
        Self {
            default_base,
            preferred_targets,
            max_targets: 15,
            default_target_cap: 10,
        }
    }

    pub fn from_config(config: &DashboardConfig) -> Result<Self> {
        Ok(Self {
            default_base: config.default_base_code()?,
            preferred_targets: config.preferred_codes()?,
            max_targets: config.max_targets,
            default_target_cap: config.default_target_cap,
        })
    }

    /// Base used when the request names none, or names one outside the universe
    fn fallback_base(&self, universe: &BTreeSet<CurrencyCode>) -> Option<CurrencyCode> {
        if universe.contains(&self.default_base) {
            Some(self.default_base.clone())
        } else {
            universe.iter().next().cloned()
        }
    }

    /// Resolve `request` against `universe`
    ///
    /// Returns `None` only for an empty universe. Every adjustment made to
    /// the request is reported as a notice.
    pub fn resolve(
        &self,
        universe: &BTreeSet<CurrencyCode>,
        request: &SelectionRequest,
    ) -> Option<(Selection, Vec<Notice>)> {
        let mut notices = Vec::new();

        let base = match &request.base {
            Some(code) if universe.contains(code) => code.clone(),
            Some(code) => {
                let fallback = self.fallback_base(universe)?;
                notices.push(Notice::warning(
                    Some(ErrorKind::InvalidCurrency),
                    format!("{} is not a supported currency; using {}", code, fallback),
                ));
                fallback
            }
            None => self.fallback_base(universe)?,
        };

        let targets = match &request.targets {
            None => self
                .preferred_targets
                .iter()
                .filter(|c| universe.contains(*c) && **c != base)
                .take(self.default_target_cap)
                .cloned()
                .collect(),
            Some(requested) => {
                let mut targets: Vec<CurrencyCode> = Vec::new();
                for code in requested {
                    if *code == base {
                        notices.push(Notice::info(format!(
                            "{} is the base currency and is not shown as a target",
                            code
                        )));
                    } else if !universe.contains(code) {
                        notices.push(Notice::warning(
                            Some(ErrorKind::InvalidCurrency),
                            format!("{} is not a supported currency", code),
                        ));
                    } else if !targets.contains(code) {
                        targets.push(code.clone());
                    }
                }
                if targets.len() > self.max_targets {
                    notices.push(Notice::warning(
                        None,
                        format!(
                            "At most {} currencies can be selected; ignoring {}",
                            self.max_targets,
                            targets[self.max_targets..]
                                .iter()
                                .map(CurrencyCode::as_str)
                                .collect::<Vec<_>>()
                                .join(", ")
                        ),
                    ));
                    targets.truncate(self.max_targets);
                }
                targets
            }
        };

        Some((Selection { base, targets }, notices))
    }
}
