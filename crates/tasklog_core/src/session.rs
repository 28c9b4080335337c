//! Application state threaded through every user intent: the task store, the
//! active filter, and the last generated report.

use crate::clipboard::Clipboard;
use crate::clock::{Clock, parse_day};
use crate::error::AppError;
use crate::filter::{
    DEFAULT_QUICK_FILTERS, DateGroup, group_by_date, quick_filter_label, report_button_label,
    resolve_range, select_tasks,
};
use crate::model::{DateRange, Filter, Task, TaskState, Transition};
use crate::report::{Report, ReportOptions, build_report_with};
use crate::storage::KeyValueStore;
use crate::task_store::{TaskCounts, TaskStore};
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSettings {
    pub quick_filters: Vec<u32>,
    pub prompt_preamble: Option<Vec<String>>,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            quick_filters: DEFAULT_QUICK_FILTERS.to_vec(),
            prompt_preamble: None,
        }
    }
}

/// Which report output a copy action wants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CopyTarget {
    Text,
    Prompt,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CopyOutcome {
    Copied,
    /// The clipboard refused; the caller shows the text for manual copying.
    Fallback { text: String, error: AppError },
}

#[derive(Debug, Clone)]
struct CachedReport {
    filter: Filter,
    report: Report,
}

pub struct Session<S: KeyValueStore, C: Clock> {
    store: TaskStore<S>,
    clock: C,
    filter: Filter,
    settings: SessionSettings,
    cached: Option<CachedReport>,
}

impl<S: KeyValueStore, C: Clock> Session<S, C> {
    pub fn open(storage: S, clock: C, settings: SessionSettings) -> Self {
        let store = TaskStore::load(storage, &clock);
        Self {
            store,
            clock,
            filter: Filter::None,
            settings,
            cached: None,
        }
    }

    /// Replaces the settings; a different preamble invalidates the cached
    /// report.
    pub fn set_settings(&mut self, settings: SessionSettings) {
        if settings.prompt_preamble != self.settings.prompt_preamble {
            self.invalidate_report();
        }
        self.settings = settings;
    }

    /// Configured quick filter presets with their menu labels.
    pub fn quick_filters(&self) -> Vec<(u32, String)> {
        self.settings
            .quick_filters
            .iter()
            .map(|&days| (days, quick_filter_label(&Filter::LastDays(days))))
            .collect()
    }

    pub fn tasks(&self) -> &[Task] {
        self.store.tasks()
    }

    pub fn filter(&self) -> &Filter {
        &self.filter
    }

    pub fn add(&mut self, text: &str) -> Result<Option<Task>, AppError> {
        let result = self.store.add(text, &self.clock);
        if matches!(result, Ok(Some(_)) | Err(_)) {
            self.invalidate_report();
        }
        result
    }

    pub fn transition(
        &mut self,
        id: &str,
        transition: Transition,
    ) -> Result<Option<Task>, AppError> {
        let trimmed_id = id.trim();
        if trimmed_id.is_empty() {
            return Err(AppError::invalid_input("id is required"));
        }

        let result = self.store.transition(trimmed_id, transition);
        if matches!(result, Ok(Some(_)) | Err(_)) {
            self.invalidate_report();
        }
        result
    }

    /// An empty date clears the filter.
    pub fn set_date_filter(&mut self, date: &str) -> Result<&Filter, AppError> {
        let filter = if date.trim().is_empty() {
            Filter::None
        } else {
            Filter::Date(parse_day(date)?)
        };
        Ok(self.apply_filter(filter))
    }

    pub fn set_quick_filter(&mut self, days: u32) -> Result<&Filter, AppError> {
        if days == 0 {
            return Err(AppError::invalid_input("days must be positive"));
        }
        let filter = Filter::LastDays(days);
        if resolve_range(&filter, self.clock.today()).is_none() {
            return Err(AppError::invalid_input(format!(
                "{days} days reaches past the earliest supported date"
            )));
        }
        if !self.settings.quick_filters.contains(&days) {
            debug!(days, "quick filter outside configured presets");
        }
        Ok(self.apply_filter(filter))
    }

    pub fn clear_filter(&mut self) -> &Filter {
        self.apply_filter(Filter::None)
    }

    fn apply_filter(&mut self, filter: Filter) -> &Filter {
        if self.filter != filter {
            info!(?filter, "filter changed");
            self.invalidate_report();
        }
        self.filter = filter;
        &self.filter
    }

    pub fn range(&self) -> Option<DateRange> {
        resolve_range(&self.filter, self.clock.today())
    }

    /// Tasks in `state` under the active filter, grouped by day.
    pub fn task_groups(&self, state: TaskState) -> Vec<DateGroup> {
        let range = self.range();
        group_by_date(select_tasks(self.store.tasks(), state, range.as_ref()))
    }

    pub fn counts(&self) -> TaskCounts {
        self.store.counts()
    }

    pub fn filter_label(&self) -> String {
        quick_filter_label(&self.filter)
    }

    pub fn report_button_label(&self) -> Option<String> {
        report_button_label(&self.filter)
    }

    /// Builds the report for the active filter and caches it for copy actions.
    pub fn generate_report(&mut self) -> &Report {
        let report = build_report_with(
            self.store.tasks(),
            &self.filter,
            self.clock.today(),
            ReportOptions {
                prompt_preamble: self.settings.prompt_preamble.as_deref(),
            },
        );
        let cached = self.cached.insert(CachedReport {
            filter: self.filter,
            report,
        });
        &cached.report
    }

    /// The cached report if it still matches the active filter, otherwise a
    /// fresh one.
    pub fn ensure_report(&mut self) -> &Report {
        match self.cached.take() {
            Some(cached) if cached.filter == self.filter => {
                debug!("reusing cached report");
                &self.cached.insert(cached).report
            }
            _ => self.generate_report(),
        }
    }

    pub fn report_text(&mut self) -> String {
        self.ensure_report().text.clone()
    }

    pub fn report_prompt(&mut self) -> String {
        self.ensure_report().prompt.clone()
    }

    pub fn copy_report(&mut self, target: CopyTarget, clipboard: &dyn Clipboard) -> CopyOutcome {
        let text = match target {
            CopyTarget::Text => self.report_text(),
            CopyTarget::Prompt => self.report_prompt(),
        };
        match clipboard.write_text(&text) {
            Ok(()) => CopyOutcome::Copied,
            Err(error) => CopyOutcome::Fallback { text, error },
        }
    }

    fn invalidate_report(&mut self) {
        self.cached = None;
    }
}
