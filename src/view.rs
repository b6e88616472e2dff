//! Saved-jobs state: a single-writer reducer over the canonical record list
//! plus the controller that runs the network calls and turns their outcomes
//! into actions and banner messages.

use futures::future::join_all;
use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::time::{Duration, Instant};
use tracing::{error, info, warn};

use crate::api::{ApiError, SavedJobsApi};
use crate::format;
use crate::models::{SavedJobRecord, SortKey};

pub const DEFAULT_BANNER_TTL: Duration = Duration::from_secs(3);

// --- Derivation ---

/// Case-insensitive substring match on title, employer and notes, then a
/// stable sort. Always derived from the canonical list, never stored.
pub fn filter_and_sort<'a>(
    records: &'a [SavedJobRecord],
    query: &str,
    sort: SortKey,
) -> Vec<&'a SavedJobRecord> {
    // Matched as typed: surrounding whitespace is part of the query
    let needle = query.to_lowercase();

    let mut filtered: Vec<&SavedJobRecord> = records
        .iter()
        .filter(|record| needle.is_empty() || matches_query(record, &needle))
        .collect();

    // sort_by is stable, so ties keep their input order
    filtered.sort_by(|a, b| compare(a, b, sort));
    filtered
}

fn matches_query(record: &SavedJobRecord, needle: &str) -> bool {
    record.job_data.title().to_lowercase().contains(needle)
        || record.job_data.employer().to_lowercase().contains(needle)
        || record
            .notes
            .as_deref()
            .is_some_and(|notes| notes.to_lowercase().contains(needle))
}

fn compare(a: &SavedJobRecord, b: &SavedJobRecord, sort: SortKey) -> Ordering {
    match sort {
        SortKey::Newest => b.saved_at.cmp(&a.saved_at),
        SortKey::Oldest => a.saved_at.cmp(&b.saved_at),
        SortKey::Title => compare_text(a.job_data.title(), b.job_data.title()),
        SortKey::Company => compare_text(a.job_data.employer(), b.job_data.employer()),
    }
}

fn compare_text(a: &str, b: &str) -> Ordering {
    a.to_lowercase().cmp(&b.to_lowercase())
}

// --- State container ---

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Loaded(Vec<SavedJobRecord>),
    SetQuery(String),
    SetSort(SortKey),
    ToggleSelect(String),
    SelectAll,
    /// Drops every record whose `job_id` is listed.
    RemoveJobs(Vec<String>),
    PatchNotes { record_id: String, notes: String },
}

#[derive(Debug, Clone, Default)]
pub struct SavedJobsState {
    saved_jobs: Vec<SavedJobRecord>,
    query: String,
    sort: SortKey,
    selected: BTreeSet<String>,
}

impl SavedJobsState {
    pub fn new(sort: SortKey) -> Self {
        Self {
            sort,
            ..Default::default()
        }
    }

    pub fn apply(&mut self, action: Action) {
        match action {
            Action::Loaded(records) => {
                self.saved_jobs = records;
                self.prune_selection();
            }
            Action::SetQuery(query) => self.query = query,
            Action::SetSort(sort) => self.sort = sort,
            Action::ToggleSelect(record_id) => {
                if !self.selected.remove(&record_id) {
                    self.selected.insert(record_id);
                }
            }
            Action::SelectAll => {
                if self.all_filtered_selected() {
                    self.selected.clear();
                } else {
                    self.selected = self.filtered().iter().map(|r| r.id.clone()).collect();
                }
            }
            Action::RemoveJobs(job_ids) => {
                self.saved_jobs.retain(|r| !job_ids.contains(&r.job_id));
                self.prune_selection();
            }
            Action::PatchNotes { record_id, notes } => {
                if let Some(record) = self.saved_jobs.iter_mut().find(|r| r.id == record_id) {
                    record.notes = Some(notes);
                }
            }
        }
    }

    /// True when every visible record is selected, including when none are
    /// visible. Drives both Select All and its label.
    pub fn all_filtered_selected(&self) -> bool {
        self.filtered().iter().all(|r| self.selected.contains(&r.id))
    }

    fn prune_selection(&mut self) {
        let saved_jobs = &self.saved_jobs;
        self.selected.retain(|id| saved_jobs.iter().any(|r| &r.id == id));
    }

    pub fn saved_jobs(&self) -> &[SavedJobRecord] {
        &self.saved_jobs
    }

    pub fn filtered(&self) -> Vec<&SavedJobRecord> {
        filter_and_sort(&self.saved_jobs, &self.query, self.sort)
    }

    pub fn record(&self, record_id: &str) -> Option<&SavedJobRecord> {
        self.saved_jobs.iter().find(|r| r.id == record_id)
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn sort(&self) -> SortKey {
        self.sort
    }

    pub fn selected(&self) -> &BTreeSet<String> {
        &self.selected
    }

    pub fn is_selected(&self, record_id: &str) -> bool {
        self.selected.contains(record_id)
    }
}

// --- Banner ---

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BannerKind {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Banner {
    pub text: String,
    pub kind: BannerKind,
    pub shown_at: Instant,
}

impl Banner {
    /// Success banners expire after `ttl`; errors stay until replaced.
    pub fn visible_at(&self, now: Instant, ttl: Duration) -> bool {
        match self.kind {
            BannerKind::Error => true,
            BannerKind::Success => now.saturating_duration_since(self.shown_at) < ttl,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotesDraft {
    pub record_id: String,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmptyState {
    pub title: &'static str,
    pub hint: &'static str,
}

/// Per-job outcome of a bulk delete.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BulkOutcome {
    pub removed: Vec<String>,
    pub failed: Vec<String>,
}

// --- Controller ---

pub struct SavedJobsView<A> {
    api: A,
    state: SavedJobsState,
    editing: Option<NotesDraft>,
    banner: Option<Banner>,
    banner_ttl: Duration,
    loading: bool,
}

impl<A: SavedJobsApi> SavedJobsView<A> {
    pub fn new(api: A, sort: SortKey, banner_ttl: Duration) -> Self {
        Self {
            api,
            state: SavedJobsState::new(sort),
            editing: None,
            banner: None,
            banner_ttl,
            loading: false,
        }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn state(&self) -> &SavedJobsState {
        &self.state
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub async fn load(&mut self) {
        self.loading = true;
        match self.api.list_saved_jobs().await {
            Ok(records) => {
                info!(count = records.len(), "loaded saved jobs");
                self.state.apply(Action::Loaded(records));
            }
            Err(e) => self.report_error("Error loading saved jobs", &e),
        }
        self.loading = false;
    }

    pub fn set_query(&mut self, query: impl Into<String>) {
        self.state.apply(Action::SetQuery(query.into()));
    }

    pub fn set_sort(&mut self, sort: SortKey) {
        self.state.apply(Action::SetSort(sort));
    }

    pub fn toggle_selection(&mut self, record_id: &str) {
        self.state.apply(Action::ToggleSelect(record_id.to_string()));
    }

    pub fn select_all(&mut self) {
        self.state.apply(Action::SelectAll);
    }

    /// Removes local records only once the server confirms.
    pub async fn unsave(&mut self, job_id: &str) -> bool {
        match self.api.unsave_job(job_id).await {
            Ok(()) => {
                let before = self.state.saved_jobs().len();
                self.state.apply(Action::RemoveJobs(vec![job_id.to_string()]));
                info!(job_id, removed = before - self.state.saved_jobs().len(), "unsaved job");
                self.show_success("Job removed from saved");
                true
            }
            Err(e) => {
                self.report_error("Error removing job", &e);
                false
            }
        }
    }

    pub async fn update_notes(&mut self, record_id: &str, text: &str) -> bool {
        match self.api.update_notes(record_id, text).await {
            Ok(()) => {
                self.state.apply(Action::PatchNotes {
                    record_id: record_id.to_string(),
                    notes: text.to_string(),
                });
                self.editing = None;
                self.show_success("Notes updated successfully");
                true
            }
            Err(e) => {
                self.report_error("Error updating notes", &e);
                false
            }
        }
    }

    /// One DELETE per distinct job among the selected records, all in flight
    /// together. Only confirmed deletions leave the local list; failures stay
    /// listed and selected.
    pub async fn bulk_delete(&mut self) -> BulkOutcome {
        if self.state.selected().is_empty() {
            return BulkOutcome::default();
        }

        let mut job_ids: Vec<String> = Vec::new();
        for record_id in self.state.selected() {
            if let Some(record) = self.state.record(record_id) {
                if !job_ids.contains(&record.job_id) {
                    job_ids.push(record.job_id.clone());
                }
            }
        }

        let api = &self.api;
        let results = join_all(job_ids.iter().map(|job_id| async move {
            (job_id.clone(), api.unsave_job(job_id).await)
        }))
        .await;

        let mut outcome = BulkOutcome::default();
        for (job_id, result) in results {
            match result {
                Ok(()) => outcome.removed.push(job_id),
                Err(e) => {
                    warn!(job_id = %job_id, error = %e, "bulk delete item failed");
                    outcome.failed.push(job_id);
                }
            }
        }

        // Banners count selected records; failed ones remain selected
        let selected_before = self.state.selected().len();
        self.state.apply(Action::RemoveJobs(outcome.removed.clone()));
        let still_selected = self.state.selected().len();
        let removed = selected_before - still_selected;

        if outcome.failed.is_empty() {
            info!(removed, "bulk delete finished");
            self.show_success(format!(
                "{} removed from saved",
                format::plural(removed, "job", "jobs")
            ));
        } else if outcome.removed.is_empty() {
            error!(failed = outcome.failed.len(), "bulk delete failed");
            self.show_error("Error deleting jobs");
        } else {
            self.show_error(format!(
                "Removed {} of {} jobs; {} failed",
                removed, selected_before, still_selected
            ));
        }

        outcome
    }

    // --- Notes edit mode ---

    pub fn begin_edit(&mut self, record_id: &str) {
        if let Some(record) = self.state.record(record_id) {
            self.editing = Some(NotesDraft {
                record_id: record.id.clone(),
                text: record.notes.clone().unwrap_or_default(),
            });
        }
    }

    pub fn set_draft(&mut self, text: impl Into<String>) {
        if let Some(draft) = self.editing.as_mut() {
            draft.text = text.into();
        }
    }

    pub fn cancel_edit(&mut self) {
        self.editing = None;
    }

    pub fn editing(&self) -> Option<&NotesDraft> {
        self.editing.as_ref()
    }

    pub async fn save_notes(&mut self) -> bool {
        let Some(draft) = self.editing.clone() else {
            return false;
        };
        self.update_notes(&draft.record_id, &draft.text).await
    }

    // --- Banner ---

    pub fn banner(&self, now: Instant) -> Option<&Banner> {
        self.banner
            .as_ref()
            .filter(|b| b.visible_at(now, self.banner_ttl))
    }

    /// Drops an expired success banner.
    pub fn tick(&mut self, now: Instant) {
        if self.banner(now).is_none() {
            self.banner = None;
        }
    }

    pub fn show_success(&mut self, text: impl Into<String>) {
        self.set_banner(text.into(), BannerKind::Success);
    }

    pub fn show_error(&mut self, text: impl Into<String>) {
        self.set_banner(text.into(), BannerKind::Error);
    }

    fn set_banner(&mut self, text: String, kind: BannerKind) {
        self.banner = Some(Banner {
            text,
            kind,
            shown_at: Instant::now(),
        });
    }

    fn report_error(&mut self, message: &str, err: &ApiError) {
        error!(error = %err, "{}", message);
        match err {
            ApiError::Unauthorized => self.show_error(format!("{}: please sign in again", message)),
            _ => self.show_error(message),
        }
    }

    // --- Presentation helpers ---

    pub fn header(&self) -> String {
        format!("Saved Jobs ({})", self.state.saved_jobs().len())
    }

    pub fn bulk_bar_visible(&self) -> bool {
        !self.state.selected().is_empty()
    }

    pub fn selection_summary(&self) -> String {
        format!(
            "{} selected",
            format::plural(self.state.selected().len(), "job", "jobs")
        )
    }

    pub fn select_all_label(&self) -> &'static str {
        if self.state.all_filtered_selected() {
            "Deselect All"
        } else {
            "Select All"
        }
    }

    pub fn empty_state(&self) -> Option<EmptyState> {
        if self.state.saved_jobs().is_empty() {
            Some(EmptyState {
                title: "No saved jobs yet",
                hint: "Start saving interesting job opportunities to keep track of them",
            })
        } else if self.state.filtered().is_empty() {
            Some(EmptyState {
                title: "No jobs match your search",
                hint: "Try adjusting your search terms",
            })
        } else {
            None
        }
    }
}

pub const NOTES_PLACEHOLDER: &str = "No notes added yet.";

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Job;
    use chrono::{DateTime, Utc};
    use reqwest::StatusCode;
    use std::collections::HashSet;
    use std::sync::Mutex;

    fn record(id: &str, job_id: &str, title: &str, employer: &str, saved_at: &str) -> SavedJobRecord {
        SavedJobRecord {
            id: id.to_string(),
            job_id: job_id.to_string(),
            job_data: Job {
                job_id: Some(job_id.to_string()),
                job_title: Some(title.to_string()),
                employer_name: Some(employer.to_string()),
                ..Default::default()
            },
            notes: None,
            saved_at: saved_at.parse::<DateTime<Utc>>().unwrap(),
        }
    }

    fn sample_records() -> Vec<SavedJobRecord> {
        vec![
            record("r1", "j1", "Senior Engineer", "Acme", "2024-01-01T00:00:00Z"),
            record("r2", "j2", "Product Designer", "Globex", "2024-03-01T00:00:00Z"),
            record("r3", "j3", "data analyst", "Initech", "2024-02-01T00:00:00Z"),
        ]
    }

    fn ids(records: &[&SavedJobRecord]) -> Vec<String> {
        records.iter().map(|r| r.id.clone()).collect()
    }

    #[derive(Default)]
    struct FakeApi {
        records: Vec<SavedJobRecord>,
        fail_list: bool,
        fail_unsave: HashSet<String>,
        fail_notes: bool,
        unsaved: Mutex<Vec<String>>,
        patched: Mutex<Vec<(String, String)>>,
    }

    impl FakeApi {
        fn with_records(records: Vec<SavedJobRecord>) -> Self {
            Self {
                records,
                ..Default::default()
            }
        }

        fn server_error() -> ApiError {
            ApiError::Status {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                body: "boom".to_string(),
            }
        }
    }

    impl SavedJobsApi for FakeApi {
        async fn list_saved_jobs(&self) -> Result<Vec<SavedJobRecord>, ApiError> {
            if self.fail_list {
                return Err(Self::server_error());
            }
            Ok(self.records.clone())
        }

        async fn unsave_job(&self, job_id: &str) -> Result<(), ApiError> {
            self.unsaved.lock().unwrap().push(job_id.to_string());
            if self.fail_unsave.contains(job_id) {
                return Err(Self::server_error());
            }
            Ok(())
        }

        async fn update_notes(&self, record_id: &str, notes: &str) -> Result<(), ApiError> {
            if self.fail_notes {
                return Err(ApiError::Unauthorized);
            }
            self.patched
                .lock()
                .unwrap()
                .push((record_id.to_string(), notes.to_string()));
            Ok(())
        }
    }

    async fn loaded_view(api: FakeApi) -> SavedJobsView<FakeApi> {
        let mut view = SavedJobsView::new(api, SortKey::Newest, DEFAULT_BANNER_TTL);
        view.load().await;
        view
    }

    // --- filter_and_sort ---

    #[test]
    fn test_filter_matches_title_case_insensitively() {
        let records = sample_records();
        let out = filter_and_sort(&records, "engineer", SortKey::Newest);
        assert_eq!(ids(&out), vec!["r1"]);
    }

    #[test]
    fn test_filter_matches_employer_and_notes() {
        let mut records = sample_records();
        records[2].notes = Some("Recruiter said GLOBAL team".to_string());

        assert_eq!(ids(&filter_and_sort(&records, "GLOBEX", SortKey::Newest)), vec!["r2"]);
        assert_eq!(ids(&filter_and_sort(&records, "global", SortKey::Newest)), vec!["r3"]);
        assert!(filter_and_sort(&records, "nothing-matches", SortKey::Newest).is_empty());
    }

    #[test]
    fn test_filter_only_returns_matching_records() {
        let mut records = sample_records();
        records[0].notes = Some("ask about on-call".to_string());
        for query in ["a", "EN", "on", "x", "acme", "call"] {
            let needle = query.to_lowercase();
            for r in filter_and_sort(&records, query, SortKey::Title) {
                let haystacks = [
                    r.job_data.title().to_lowercase(),
                    r.job_data.employer().to_lowercase(),
                    r.notes.clone().unwrap_or_default().to_lowercase(),
                ];
                assert!(haystacks.iter().any(|h| h.contains(&needle)), "{} vs {}", query, r.id);
            }
        }
    }

    #[test]
    fn test_empty_query_keeps_everything() {
        let records = sample_records();
        assert_eq!(filter_and_sort(&records, "", SortKey::Newest).len(), 3);
    }

    #[test]
    fn test_whitespace_in_query_is_matched_literally() {
        let records = sample_records();
        assert!(filter_and_sort(&records, "engineer ", SortKey::Newest).is_empty());
        assert!(filter_and_sort(&records, "  ", SortKey::Newest).is_empty());
        assert_eq!(ids(&filter_and_sort(&records, "senior ", SortKey::Newest)), vec!["r1"]);
    }

    #[test]
    fn test_sort_by_saved_at() {
        let records = sample_records();
        assert_eq!(ids(&filter_and_sort(&records, "", SortKey::Newest)), vec!["r2", "r3", "r1"]);
        assert_eq!(ids(&filter_and_sort(&records, "", SortKey::Oldest)), vec!["r1", "r3", "r2"]);
    }

    #[test]
    fn test_sort_oldest_january_before_march() {
        let records = vec![
            record("march", "j1", "A", "A", "2024-03-01T00:00:00Z"),
            record("january", "j2", "B", "B", "2024-01-01T00:00:00Z"),
        ];
        let out = filter_and_sort(&records, "", SortKey::Oldest);
        assert_eq!(out[0].id, "january");
    }

    #[test]
    fn test_sort_by_title_and_company_ignores_case() {
        let records = sample_records();
        assert_eq!(ids(&filter_and_sort(&records, "", SortKey::Title)), vec!["r3", "r2", "r1"]);
        assert_eq!(ids(&filter_and_sort(&records, "", SortKey::Company)), vec!["r1", "r2", "r3"]);
    }

    #[test]
    fn test_sort_ties_keep_input_order() {
        let records = vec![
            record("first", "j1", "Same", "Same", "2024-01-01T00:00:00Z"),
            record("second", "j2", "Same", "Same", "2024-01-01T00:00:00Z"),
            record("third", "j3", "Same", "Same", "2024-01-01T00:00:00Z"),
        ];
        for sort in [SortKey::Newest, SortKey::Oldest, SortKey::Title, SortKey::Company] {
            assert_eq!(
                ids(&filter_and_sort(&records, "", sort)),
                vec!["first", "second", "third"]
            );
        }
    }

    #[test]
    fn test_filter_and_sort_is_idempotent() {
        let records = sample_records();
        let once: Vec<SavedJobRecord> = filter_and_sort(&records, "e", SortKey::Company)
            .into_iter()
            .cloned()
            .collect();
        let twice = filter_and_sort(&once, "e", SortKey::Company);
        assert_eq!(ids(&twice), once.iter().map(|r| r.id.clone()).collect::<Vec<_>>());
    }

    #[test]
    fn test_missing_fields_are_treated_as_empty() {
        let mut records = sample_records();
        records[0].job_data.job_title = None;
        records[0].job_data.employer_name = None;
        assert!(filter_and_sort(&records, "engineer", SortKey::Newest).is_empty());
        assert_eq!(filter_and_sort(&records, "", SortKey::Title)[0].id, "r1");
    }

    // --- reducer ---

    #[test]
    fn test_select_all_is_relative_to_filtered_view() {
        let mut state = SavedJobsState::new(SortKey::Newest);
        state.apply(Action::Loaded(sample_records()));
        state.apply(Action::SetQuery("engineer".to_string()));
        state.apply(Action::SelectAll);
        assert_eq!(state.selected().iter().cloned().collect::<Vec<_>>(), vec!["r1"]);
    }

    #[test]
    fn test_select_all_twice_restores_selection() {
        let mut state = SavedJobsState::new(SortKey::Newest);
        state.apply(Action::Loaded(sample_records()));

        state.apply(Action::SelectAll);
        assert_eq!(state.selected().len(), 3);
        state.apply(Action::SelectAll);
        assert!(state.selected().is_empty());

        // Starting from a full selection comes back to it as well
        state.apply(Action::SelectAll);
        let full = state.selected().clone();
        state.apply(Action::SelectAll);
        state.apply(Action::SelectAll);
        assert_eq!(state.selected(), &full);
    }

    #[test]
    fn test_select_all_with_partial_selection_selects_filtered() {
        let mut state = SavedJobsState::new(SortKey::Newest);
        state.apply(Action::Loaded(sample_records()));
        state.apply(Action::ToggleSelect("r2".to_string()));
        state.apply(Action::SelectAll);
        assert_eq!(state.selected().len(), 3);
    }

    #[test]
    fn test_toggle_select() {
        let mut state = SavedJobsState::new(SortKey::Newest);
        state.apply(Action::Loaded(sample_records()));
        state.apply(Action::ToggleSelect("r1".to_string()));
        assert!(state.is_selected("r1"));
        state.apply(Action::ToggleSelect("r1".to_string()));
        assert!(!state.is_selected("r1"));
    }

    #[test]
    fn test_reload_prunes_selection() {
        let mut state = SavedJobsState::new(SortKey::Newest);
        state.apply(Action::Loaded(sample_records()));
        state.apply(Action::ToggleSelect("r1".to_string()));
        state.apply(Action::ToggleSelect("r2".to_string()));
        state.apply(Action::Loaded(sample_records()[1..].to_vec()));
        assert_eq!(state.selected().iter().cloned().collect::<Vec<_>>(), vec!["r2"]);
    }

    #[test]
    fn test_patch_notes_touches_only_one_record() {
        let mut state = SavedJobsState::new(SortKey::Newest);
        state.apply(Action::Loaded(sample_records()));
        state.apply(Action::PatchNotes {
            record_id: "r2".to_string(),
            notes: "follow up".to_string(),
        });
        for r in state.saved_jobs() {
            if r.id == "r2" {
                assert_eq!(r.notes.as_deref(), Some("follow up"));
            } else {
                assert_eq!(r.notes, None);
            }
        }
    }

    // --- controller ---

    #[tokio::test]
    async fn test_load_replaces_canonical_list() {
        let view = loaded_view(FakeApi::with_records(sample_records())).await;
        assert_eq!(view.state().saved_jobs().len(), 3);
        assert!(!view.is_loading());
        assert_eq!(view.header(), "Saved Jobs (3)");
        assert!(view.banner(Instant::now()).is_none());
    }

    #[tokio::test]
    async fn test_load_failure_shows_error_and_keeps_state() {
        let api = FakeApi {
            fail_list: true,
            ..Default::default()
        };
        let view = loaded_view(api).await;
        let banner = view.banner(Instant::now()).unwrap();
        assert_eq!(banner.text, "Error loading saved jobs");
        assert_eq!(banner.kind, BannerKind::Error);
        assert!(view.state().saved_jobs().is_empty());
    }

    #[tokio::test]
    async fn test_unsave_removes_every_record_for_job() {
        let mut records = sample_records();
        // Re-saved job: new record, same job id
        records.push(record("r4", "j1", "Senior Engineer", "Acme", "2024-04-01T00:00:00Z"));
        let mut view = loaded_view(FakeApi::with_records(records)).await;

        assert!(view.unsave("j1").await);
        let remaining = view.state().saved_jobs();
        assert_eq!(remaining.len(), 2);
        assert!(remaining.iter().all(|r| r.job_id != "j1"));
        assert_eq!(view.banner(Instant::now()).unwrap().text, "Job removed from saved");
        assert_eq!(view.api().unsaved.lock().unwrap().clone(), vec!["j1"]);
    }

    #[tokio::test]
    async fn test_unsave_failure_leaves_state_unchanged() {
        let mut api = FakeApi::with_records(sample_records());
        api.fail_unsave.insert("j2".to_string());
        let mut view = loaded_view(api).await;

        assert!(!view.unsave("j2").await);
        assert_eq!(view.state().saved_jobs().len(), 3);
        let banner = view.banner(Instant::now()).unwrap();
        assert_eq!(banner.text, "Error removing job");
        assert_eq!(banner.kind, BannerKind::Error);
    }

    #[tokio::test]
    async fn test_update_notes_patches_record_and_exits_edit_mode() {
        let mut view = loaded_view(FakeApi::with_records(sample_records())).await;
        view.begin_edit("r3");
        assert_eq!(view.editing().unwrap().text, "");
        view.set_draft("Referral from Sam");

        assert!(view.save_notes().await);
        assert!(view.editing().is_none());
        assert_eq!(
            view.state().record("r3").unwrap().notes.as_deref(),
            Some("Referral from Sam")
        );
        assert_eq!(view.state().record("r1").unwrap().notes, None);
        assert_eq!(
            view.api().patched.lock().unwrap().clone(),
            vec![("r3".to_string(), "Referral from Sam".to_string())]
        );
        assert_eq!(view.banner(Instant::now()).unwrap().text, "Notes updated successfully");
    }

    #[tokio::test]
    async fn test_update_notes_failure_keeps_edit_mode() {
        let mut api = FakeApi::with_records(sample_records());
        api.fail_notes = true;
        let mut view = loaded_view(api).await;
        view.begin_edit("r1");
        view.set_draft("draft text");

        assert!(!view.save_notes().await);
        assert_eq!(view.editing().unwrap().text, "draft text");
        assert_eq!(view.state().record("r1").unwrap().notes, None);
        assert_eq!(
            view.banner(Instant::now()).unwrap().text,
            "Error updating notes: please sign in again"
        );
    }

    #[tokio::test]
    async fn test_cancel_edit_discards_draft() {
        let mut view = loaded_view(FakeApi::with_records(sample_records())).await;
        view.begin_edit("r1");
        view.set_draft("never saved");
        view.cancel_edit();
        assert!(view.editing().is_none());
        assert!(!view.save_notes().await);
        assert!(view.api().patched.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_bulk_delete_removes_all_selected() {
        let mut view = loaded_view(FakeApi::with_records(sample_records())).await;
        view.toggle_selection("r1");
        view.toggle_selection("r3");
        assert!(view.bulk_bar_visible());
        assert_eq!(view.selection_summary(), "2 jobs selected");

        let outcome = view.bulk_delete().await;
        assert_eq!(outcome.failed, Vec::<String>::new());
        assert_eq!(outcome.removed.len(), 2);
        assert_eq!(ids(&view.state().filtered()), vec!["r2"]);
        assert!(view.state().selected().is_empty());
        assert!(!view.bulk_bar_visible());
        assert_eq!(view.banner(Instant::now()).unwrap().text, "2 jobs removed from saved");
    }

    #[tokio::test]
    async fn test_bulk_delete_reports_partial_failure() {
        let mut api = FakeApi::with_records(sample_records());
        api.fail_unsave.insert("j2".to_string());
        let mut view = loaded_view(api).await;
        view.select_all();

        let outcome = view.bulk_delete().await;
        assert_eq!(outcome.failed, vec!["j2"]);
        assert_eq!(ids(&view.state().filtered()), vec!["r2"]);
        // The failed record stays selected for a retry
        assert!(view.state().is_selected("r2"));
        let banner = view.banner(Instant::now()).unwrap();
        assert_eq!(banner.text, "Removed 2 of 3 jobs; 1 failed");
        assert_eq!(banner.kind, BannerKind::Error);
    }

    #[tokio::test]
    async fn test_bulk_delete_banner_counts_selected_records() {
        let mut records = sample_records();
        records.push(record("r4", "j1", "Senior Engineer", "Acme", "2024-04-01T00:00:00Z"));
        let mut api = FakeApi::with_records(records);
        api.fail_unsave.insert("j2".to_string());
        let mut view = loaded_view(api).await;
        view.toggle_selection("r1");
        view.toggle_selection("r4");
        view.toggle_selection("r2");

        let outcome = view.bulk_delete().await;
        assert_eq!(outcome.removed, vec!["j1"]);
        assert_eq!(outcome.failed, vec!["j2"]);
        assert_eq!(
            view.banner(Instant::now()).unwrap().text,
            "Removed 2 of 3 jobs; 1 failed"
        );
    }

    #[tokio::test]
    async fn test_bulk_delete_all_failed() {
        let mut api = FakeApi::with_records(sample_records());
        api.fail_unsave.insert("j1".to_string());
        let mut view = loaded_view(api).await;
        view.toggle_selection("r1");

        view.bulk_delete().await;
        assert_eq!(view.state().saved_jobs().len(), 3);
        assert_eq!(view.banner(Instant::now()).unwrap().text, "Error deleting jobs");
    }

    #[tokio::test]
    async fn test_bulk_delete_sends_one_request_per_job() {
        let mut records = sample_records();
        records.push(record("r4", "j1", "Senior Engineer", "Acme", "2024-04-01T00:00:00Z"));
        let mut view = loaded_view(FakeApi::with_records(records)).await;
        view.toggle_selection("r1");
        view.toggle_selection("r4");

        view.bulk_delete().await;
        assert_eq!(view.api().unsaved.lock().unwrap().clone(), vec!["j1"]);
        assert_eq!(view.state().saved_jobs().len(), 2);
        assert_eq!(view.banner(Instant::now()).unwrap().text, "2 jobs removed from saved");
    }

    #[tokio::test]
    async fn test_bulk_delete_with_empty_selection_is_noop() {
        let mut view = loaded_view(FakeApi::with_records(sample_records())).await;
        let outcome = view.bulk_delete().await;
        assert_eq!(outcome, BulkOutcome::default());
        assert!(view.api().unsaved.lock().unwrap().is_empty());
        assert!(view.banner(Instant::now()).is_none());
    }

    #[tokio::test]
    async fn test_labels_and_empty_states() {
        let mut view = loaded_view(FakeApi::with_records(sample_records())).await;
        assert_eq!(view.select_all_label(), "Select All");
        assert_eq!(view.empty_state(), None);

        view.select_all();
        assert_eq!(view.select_all_label(), "Deselect All");

        view.set_query("no such job");
        assert_eq!(view.empty_state().unwrap().title, "No jobs match your search");

        let empty = loaded_view(FakeApi::default()).await;
        assert_eq!(empty.empty_state().unwrap().title, "No saved jobs yet");
    }

    #[tokio::test]
    async fn test_select_all_label_ignores_hidden_selection() {
        let mut view = loaded_view(FakeApi::with_records(sample_records())).await;
        view.toggle_selection("r1");
        view.set_query("globex");

        // r1 is selected but hidden; r2 is visible and unselected
        assert!(!view.state().all_filtered_selected());
        assert_eq!(view.select_all_label(), "Select All");

        view.select_all();
        assert!(view.state().is_selected("r2"));
        assert_eq!(view.select_all_label(), "Deselect All");
    }

    #[test]
    fn test_success_banner_expires_error_banner_persists() {
        let start = Instant::now();
        let success = Banner {
            text: "ok".to_string(),
            kind: BannerKind::Success,
            shown_at: start,
        };
        assert!(success.visible_at(start + Duration::from_secs(2), DEFAULT_BANNER_TTL));
        assert!(!success.visible_at(start + Duration::from_secs(3), DEFAULT_BANNER_TTL));

        let failure = Banner {
            kind: BannerKind::Error,
            ..success
        };
        assert!(failure.visible_at(start + Duration::from_secs(600), DEFAULT_BANNER_TTL));
    }

    #[tokio::test]
    async fn test_tick_clears_expired_banner() {
        let mut view = SavedJobsView::new(FakeApi::default(), SortKey::Newest, Duration::ZERO);
        view.show_success("done");
        view.tick(Instant::now());
        assert!(view.banner(Instant::now()).is_none());

        view.show_error("still here");
        view.tick(Instant::now());
        assert_eq!(view.banner(Instant::now()).unwrap().text, "still here");
    }
}
