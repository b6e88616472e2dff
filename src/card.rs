use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};

use crate::browser;
use crate::format;
use crate::models::Job;
use crate::skills;

pub const MAX_SKILLS: usize = 6;
pub const MAX_BENEFITS: usize = 3;
const DESCRIPTION_CHARS: usize = 200;

/// Logo image state. An errored logo stays errored for as long as the card
/// shows the same job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogoState {
    Loaded,
    Errored,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Logo {
    Image(String),
    Glyph,
}

/// Display values derived from one job. Rebuilt on every render.
#[derive(Debug, Clone, PartialEq)]
pub struct CardView {
    pub title: String,
    pub employer: String,
    pub match_score: Option<u8>,
    pub saved: bool,
    pub logo: Logo,
    pub location: String,
    pub employment_type: Option<String>,
    pub remote: bool,
    pub description: String,
    pub salary: Option<String>,
    pub skills: Vec<String>,
    pub skills_overflow: Option<String>,
    pub benefits: Vec<String>,
    pub benefits_overflow: Option<String>,
    pub footer: String,
}

impl CardView {
    pub fn save_label(&self) -> &'static str {
        if self.saved { "Unsave job" } else { "Save job" }
    }
}

#[derive(Debug, Clone)]
pub struct JobCard {
    job: Job,
    saved: bool,
    show_match_score: bool,
    logo_state: LogoState,
}

impl JobCard {
    pub fn new(job: Job) -> Self {
        Self {
            job,
            saved: false,
            show_match_score: true,
            logo_state: LogoState::Loaded,
        }
    }

    pub fn saved(mut self, saved: bool) -> Self {
        self.saved = saved;
        self
    }

    pub fn show_match_score(mut self, show: bool) -> Self {
        self.show_match_score = show;
        self
    }

    pub fn logo_state(&self) -> LogoState {
        self.logo_state
    }

    /// Points the card at `job`. A different job is a new card identity, so
    /// the logo state starts over.
    pub fn sync(&mut self, job: &Job) {
        if self.job != *job {
            self.job = job.clone();
            self.logo_state = LogoState::Loaded;
        }
    }

    pub fn mark_image_error(&mut self) {
        self.logo_state = LogoState::Errored;
    }

    pub fn logo_url(&self) -> Option<String> {
        skills::company_logo_url(&self.job)
    }

    pub fn logo(&self) -> Logo {
        match (self.logo_state, self.logo_url()) {
            (LogoState::Loaded, Some(url)) => Logo::Image(url),
            _ => Logo::Glyph,
        }
    }

    pub fn view(&self, now: DateTime<Utc>) -> CardView {
        let job = &self.job;

        let all_skills = skills::extract_skills(job);
        let skills_overflow = (all_skills.len() > MAX_SKILLS)
            .then(|| format!("+{} more", all_skills.len() - MAX_SKILLS));

        // Some providers only list benefits under the highlights
        let all_benefits = job
            .job_benefits
            .clone()
            .or_else(|| job.job_highlights.as_ref().and_then(|h| h.benefits.clone()))
            .unwrap_or_default();
        let benefits_overflow = (all_benefits.len() > MAX_BENEFITS)
            .then(|| format!("+{} benefits", all_benefits.len() - MAX_BENEFITS));

        let publisher = job.job_publisher.as_deref().unwrap_or("Unknown");

        CardView {
            title: job.title().to_string(),
            employer: job.employer().to_string(),
            match_score: self.show_match_score.then(|| skills::match_score(job)),
            saved: self.saved,
            logo: self.logo(),
            location: format::location(
                job.job_city.as_deref(),
                job.job_state.as_deref(),
                job.job_country.as_deref(),
            ),
            employment_type: job
                .job_employment_type
                .as_deref()
                .filter(|t| !t.trim().is_empty())
                .map(format::employment_type),
            remote: job.job_is_remote == Some(true),
            description: format::truncate_description(job.job_description.as_deref(), DESCRIPTION_CHARS),
            salary: format::salary_range(
                job.job_min_salary,
                job.job_max_salary,
                job.job_salary_currency.as_deref(),
                job.job_salary_period.as_deref(),
            ),
            skills: all_skills.into_iter().take(MAX_SKILLS).collect(),
            skills_overflow,
            benefits: all_benefits.into_iter().take(MAX_BENEFITS).collect(),
            benefits_overflow,
            footer: format!(
                "{} • via {}",
                format::posted_date(job.job_posted_at_datetime_utc.as_deref(), now),
                publisher
            ),
        }
    }

    /// Save/unsave intent. The callback gets the snapshot's job id, empty when
    /// the snapshot has none.
    pub fn save(&self, on_save: Option<&mut dyn FnMut(&str)>) {
        if let Some(on_save) = on_save {
            on_save(self.job.job_id.as_deref().unwrap_or_default());
        }
    }

    /// Apply intent: the caller's handler if given, otherwise the apply link is
    /// opened in the system browser.
    pub fn apply(&self, on_apply: Option<&mut dyn FnMut(&Job)>) -> Result<()> {
        self.apply_with(on_apply, browser::open_url)
    }

    fn apply_with(
        &self,
        on_apply: Option<&mut dyn FnMut(&Job)>,
        open: impl FnOnce(&str) -> Result<()>,
    ) -> Result<()> {
        if let Some(on_apply) = on_apply {
            on_apply(&self.job);
            return Ok(());
        }
        match self.job.job_apply_link.as_deref() {
            Some(link) if !link.trim().is_empty() => open(link),
            _ => Err(anyhow!("No apply link for '{}'", self.job.title())),
        }
    }
}
