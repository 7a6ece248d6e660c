use std::collections::{BTreeSet, VecDeque};

use chrono::NaiveDate;

use crate::aggregate::{AggregateOptions, PlayerSummary, aggregate};
use crate::api_types::{AnalyzeRequest, Encounter};
use crate::death::DeathRecord;
use crate::error::AnalysisError;
use crate::rank::{SortKey, SortState, sort_summaries};

pub type RequestId = u64;

/// What the screen shows. Each transition consumes the old value and returns the next.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum View {
    #[default]
    Form,
    Loading {
        request: RequestId,
    },
    Results(ResultsView),
    Error {
        message: String,
    },
}

impl View {
    /// Form -> Loading. Any other view ignores the submission.
    pub fn submit(self, request: RequestId) -> View {
        match self {
            View::Form => View::Loading { request },
            other => other,
        }
    }

    /// Loading -> Results | Error, but only for the request being waited on.
    ///
    /// Records are aggregated here, before the new view exists, so a rejected
    /// batch never produces a partial table.
    pub fn settle(
        self,
        request: RequestId,
        outcome: Result<Vec<DeathRecord>, AnalysisError>,
        opts: &AggregateOptions,
    ) -> View {
        match self {
            View::Loading { request: pending } if pending == request => {
                match outcome.and_then(|records| aggregate(&records, opts)) {
                    Ok(summaries) => View::Results(ResultsView::new(summaries)),
                    Err(err) => View::Error {
                        message: err.user_message(),
                    },
                }
            }
            other => other,
        }
    }

    /// Back to an empty form; results, error text and view substate are dropped.
    pub fn back(self) -> View {
        View::Form
    }

    pub fn is_loading_request(&self, request: RequestId) -> bool {
        matches!(self, View::Loading { request: pending } if *pending == request)
    }

    pub fn results(&self) -> Option<&ResultsView> {
        match self {
            View::Results(results) => Some(results),
            _ => None,
        }
    }

    fn map_results(self, f: impl FnOnce(ResultsView) -> ResultsView) -> View {
        match self {
            View::Results(results) => View::Results(f(results)),
            other => other,
        }
    }
}

/// Summary table plus its interactive substate.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultsView {
    summaries: Vec<PlayerSummary>,
    expanded: BTreeSet<String>,
    sort: SortState,
    cursor: usize,
}

impl ResultsView {
    pub fn new(summaries: Vec<PlayerSummary>) -> Self {
        Self {
            summaries,
            expanded: BTreeSet::new(),
            sort: SortState::default(),
            cursor: 0,
        }
    }

    pub fn summaries(&self) -> &[PlayerSummary] {
        &self.summaries
    }

    /// Zero qualifying players: rendered as "no results", not as an error.
    pub fn is_empty(&self) -> bool {
        self.summaries.is_empty()
    }

    pub fn sort(&self) -> SortState {
        self.sort
    }

    pub fn rows(&self) -> Vec<&PlayerSummary> {
        sort_summaries(&self.summaries, self.sort)
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn selected(&self) -> Option<&PlayerSummary> {
        self.rows().get(self.cursor).copied()
    }

    pub fn is_expanded(&self, name: &str) -> bool {
        self.expanded.contains(name)
    }

    pub fn expanded(&self) -> &BTreeSet<String> {
        &self.expanded
    }

    /// Re-sort; the cursor stays on the same player.
    pub fn sorted_by(self, key: SortKey) -> Self {
        let selected = self.selected().map(|p| p.name.clone());
        let sort = self.sort.select(key);
        let cursor = selected
            .and_then(|name| {
                sort_summaries(&self.summaries, sort)
                    .iter()
                    .position(|p| p.name == name)
            })
            .unwrap_or(0);
        Self {
            sort,
            cursor,
            ..self
        }
    }

    pub fn toggled(self, name: &str) -> Self {
        let mut expanded = self.expanded;
        if !expanded.remove(name) {
            expanded.insert(name.to_string());
        }
        Self { expanded, ..self }
    }

    pub fn toggled_selected(self) -> Self {
        let selected = self.selected().map(|p| p.name.clone());
        match selected {
            Some(name) => self.toggled(&name),
            None => self,
        }
    }

    pub fn moved(self, step: isize) -> Self {
        let total = self.summaries.len();
        if total == 0 {
            return Self { cursor: 0, ..self };
        }
        let cursor = self.cursor.saturating_add_signed(step).min(total - 1);
        Self { cursor, ..self }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormMode {
    Reports,
    Guild,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormField {
    Encounter,
    Report(usize),
    GuildName,
    ServerSlug,
    ServerRegion,
    StartDate,
    EndDate,
}

/// Terminal stand-in for the submission form.
#[derive(Debug, Clone)]
pub struct FormState {
    pub mode: FormMode,
    pub encounter: usize,
    pub reports: Vec<String>,
    pub guild_name: String,
    pub server_slug: String,
    pub server_region: String,
    pub start_date: String,
    pub end_date: String,
    pub focus: FormField,
}

impl Default for FormState {
    fn default() -> Self {
        Self::new()
    }
}

impl FormState {
    pub fn new() -> Self {
        Self {
            mode: FormMode::Reports,
            encounter: 0,
            reports: vec![String::new()],
            guild_name: String::new(),
            server_slug: String::new(),
            server_region: String::new(),
            start_date: String::new(),
            end_date: String::new(),
            focus: FormField::Encounter,
        }
    }

    pub fn fields(&self) -> Vec<FormField> {
        let mut fields = vec![FormField::Encounter];
        match self.mode {
            FormMode::Reports => {
                fields.extend((0..self.reports.len()).map(FormField::Report));
            }
            FormMode::Guild => fields.extend([
                FormField::GuildName,
                FormField::ServerSlug,
                FormField::ServerRegion,
                FormField::StartDate,
                FormField::EndDate,
            ]),
        }
        fields
    }

    pub fn focus_next(&mut self) {
        self.shift_focus(1);
    }

    pub fn focus_prev(&mut self) {
        self.shift_focus(-1);
    }

    fn shift_focus(&mut self, step: isize) {
        let fields = self.fields();
        let pos = fields.iter().position(|f| *f == self.focus).unwrap_or(0) as isize;
        let len = fields.len() as isize;
        let next = (pos + step).rem_euclid(len) as usize;
        self.focus = fields[next];
    }

    pub fn toggle_mode(&mut self) {
        self.mode = match self.mode {
            FormMode::Reports => FormMode::Guild,
            FormMode::Guild => FormMode::Reports,
        };
        self.focus = FormField::Encounter;
    }

    pub fn cycle_encounter(&mut self, count: usize, forward: bool) {
        if count == 0 {
            self.encounter = 0;
            return;
        }
        self.encounter = if forward {
            (self.encounter + 1) % count
        } else {
            (self.encounter + count - 1) % count
        };
    }

    fn focused_text(&mut self) -> Option<&mut String> {
        match self.focus {
            FormField::Encounter => None,
            FormField::Report(idx) => self.reports.get_mut(idx),
            FormField::GuildName => Some(&mut self.guild_name),
            FormField::ServerSlug => Some(&mut self.server_slug),
            FormField::ServerRegion => Some(&mut self.server_region),
            FormField::StartDate => Some(&mut self.start_date),
            FormField::EndDate => Some(&mut self.end_date),
        }
    }

    pub fn input_char(&mut self, c: char) {
        if let Some(text) = self.focused_text() {
            text.push(c);
        }
    }

    pub fn backspace(&mut self) {
        if let Some(text) = self.focused_text() {
            text.pop();
        }
    }

    pub fn add_report(&mut self) {
        if self.mode != FormMode::Reports {
            return;
        }
        self.reports.push(String::new());
        self.focus = FormField::Report(self.reports.len() - 1);
    }

    /// Remove the focused report row; the last remaining row stays.
    pub fn remove_report(&mut self) {
        let FormField::Report(idx) = self.focus else {
            return;
        };
        if self.reports.len() <= 1 || idx >= self.reports.len() {
            return;
        }
        self.reports.remove(idx);
        self.focus = FormField::Report(idx.min(self.reports.len() - 1));
    }

    pub fn build_request(&self, encounters: &[Encounter]) -> Result<AnalyzeRequest, String> {
        let encounter = encounters
            .get(self.encounter)
            .ok_or_else(|| "No encounter selected".to_string())?;

        match self.mode {
            FormMode::Reports => {
                let reports: Vec<String> = self
                    .reports
                    .iter()
                    .map(|s| s.trim())
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect();
                if reports.is_empty() {
                    return Err("Enter at least one report code".to_string());
                }
                Ok(AnalyzeRequest::Reports {
                    reports,
                    encounter_id: encounter.id,
                })
            }
            FormMode::Guild => {
                let guild_name = required(&self.guild_name, "Guild name")?;
                let server_slug = required(&self.server_slug, "Server")?;
                let server_region = required(&self.server_region, "Region")?;
                let start = parse_date(&self.start_date, "Start date")?;
                let end = parse_date(&self.end_date, "End date")?;
                if end < start {
                    return Err("End date is before start date".to_string());
                }
                Ok(AnalyzeRequest::guild_range(
                    guild_name,
                    server_slug,
                    &server_region.to_lowercase(),
                    start,
                    end,
                    encounter.id,
                ))
            }
        }
    }
}

fn required<'a>(value: &'a str, label: &str) -> Result<&'a str, String> {
    let value = value.trim();
    if value.is_empty() {
        Err(format!("{label} is required"))
    } else {
        Ok(value)
    }
}

fn parse_date(value: &str, label: &str) -> Result<NaiveDate, String> {
    let value = required(value, label)?;
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|_| format!("{label} must look like YYYY-MM-DD"))
}

#[derive(Debug, Clone)]
pub struct AppState {
    pub view: View,
    pub form: FormState,
    pub encounters: Vec<Encounter>,
    pub encounters_loading: bool,
    pub in_flight: Option<RequestId>,
    pub aggregate: AggregateOptions,
    pub logs: VecDeque<String>,
    pub help_overlay: bool,
    pub console_open: bool,
    next_request: RequestId,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(AggregateOptions::default())
    }
}

impl AppState {
    pub fn new(aggregate: AggregateOptions) -> Self {
        Self {
            view: View::Form,
            form: FormState::new(),
            encounters: Vec::new(),
            encounters_loading: false,
            in_flight: None,
            aggregate,
            logs: VecDeque::with_capacity(200),
            help_overlay: false,
            console_open: false,
            next_request: 1,
        }
    }

    pub fn push_log(&mut self, msg: impl Into<String>) {
        const MAX_LOGS: usize = 200;
        self.logs.push_back(msg.into());
        while self.logs.len() > MAX_LOGS {
            self.logs.pop_front();
        }
    }

    fn replace_view(&mut self, f: impl FnOnce(View) -> View) {
        let current = std::mem::take(&mut self.view);
        self.view = f(current);
    }

    /// Submitting is only possible from the form with nothing in flight.
    pub fn can_submit(&self) -> bool {
        matches!(self.view, View::Form) && self.in_flight.is_none()
    }

    /// Validate the form and move to `Loading`.
    ///
    /// Returns the request to hand to the provider, or `None` when submission
    /// is disabled or the form is incomplete.
    pub fn begin_request(&mut self) -> Option<(RequestId, AnalyzeRequest)> {
        if !self.can_submit() {
            if let Some(pending) = self.in_flight {
                self.push_log(format!("[INFO] Request #{pending} still running"));
            }
            return None;
        }
        let body = match self.form.build_request(&self.encounters) {
            Ok(body) => body,
            Err(msg) => {
                self.push_log(format!("[WARN] {msg}"));
                return None;
            }
        };
        let request = self.next_request;
        self.next_request += 1;
        self.in_flight = Some(request);
        self.replace_view(|view| view.submit(request));
        Some((request, body))
    }

    /// Abandon the current view. A request still running is left to settle and
    /// its response is discarded.
    pub fn go_back(&mut self) {
        self.replace_view(View::back);
    }

    pub fn sort_results(&mut self, key: SortKey) {
        self.replace_view(|view| view.map_results(|r| r.sorted_by(key)));
    }

    pub fn toggle_selected(&mut self) {
        self.replace_view(|view| view.map_results(ResultsView::toggled_selected));
    }

    pub fn toggle_player(&mut self, name: &str) {
        self.replace_view(|view| view.map_results(|r| r.toggled(name)));
    }

    pub fn move_cursor(&mut self, step: isize) {
        self.replace_view(|view| view.map_results(|r| r.moved(step)));
    }

    pub fn selected_encounter(&self) -> Option<&Encounter> {
        self.encounters.get(self.form.encounter)
    }
}

#[derive(Debug, Clone)]
pub enum Delta {
    SetEncounters(Vec<Encounter>),
    AnalysisSettled {
        request: RequestId,
        outcome: Result<Vec<DeathRecord>, AnalysisError>,
    },
    Log(String),
}

#[derive(Debug, Clone)]
pub enum ProviderCommand {
    FetchEncounters,
    Analyze {
        request: RequestId,
        body: AnalyzeRequest,
    },
}

pub fn apply_delta(state: &mut AppState, delta: Delta) {
    match delta {
        Delta::SetEncounters(encounters) => {
            state.encounters_loading = false;
            if encounters.is_empty() {
                state.push_log("[WARN] Service returned no encounters");
            } else {
                state.push_log(format!("[INFO] Loaded {} encounters", encounters.len()));
            }
            state.encounters = encounters;
            // First encounter is the default selection.
            state.form.encounter = 0;
        }
        Delta::AnalysisSettled { request, outcome } => {
            if state.in_flight == Some(request) {
                state.in_flight = None;
            }
            if !state.view.is_loading_request(request) {
                state.push_log(format!("[INFO] Discarded stale response #{request}"));
                return;
            }
            match &outcome {
                Ok(records) => state.push_log(format!(
                    "[INFO] Request #{request} returned {} death records",
                    records.len()
                )),
                Err(err) => state.push_log(format!("[WARN] Request #{request} failed: {err}")),
            }
            let opts = state.aggregate.clone();
            state.replace_view(|view| view.settle(request, outcome, &opts));
            if let View::Results(results) = &state.view {
                let players = results.summaries().len();
                state.push_log(format!("[INFO] {players} players with bad deaths"));
            }
        }
        Delta::Log(msg) => state.push_log(msg),
    }
}
