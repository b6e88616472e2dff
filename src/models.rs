use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Job snapshot embedded in a saved record. Every field is optional because the
/// snapshot is whatever the search provider returned at save time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Job {
    pub job_id: Option<String>,
    pub job_title: Option<String>,
    pub employer_name: Option<String>,
    pub employer_logo: Option<String>,
    pub employer_website: Option<String>,
    pub job_publisher: Option<String>,
    pub job_employment_type: Option<String>, // "FULLTIME", "CONTRACTOR", ...
    pub job_apply_link: Option<String>,
    pub job_description: Option<String>,
    #[serde(deserialize_with = "lenient::flag")]
    pub job_is_remote: Option<bool>,
    pub job_posted_at_datetime_utc: Option<String>,
    pub job_city: Option<String>,
    pub job_state: Option<String>,
    pub job_country: Option<String>,
    pub job_benefits: Option<Vec<String>>,
    pub job_highlights: Option<JobHighlights>,
    #[serde(deserialize_with = "lenient::number")]
    pub job_min_salary: Option<f64>,
    #[serde(deserialize_with = "lenient::number")]
    pub job_max_salary: Option<f64>,
    pub job_salary_currency: Option<String>,
    pub job_salary_period: Option<String>, // "YEAR", "MONTH", "HOUR", ...
    pub job_required_skills: Option<Vec<String>>,
}

/// Snapshot scalars arrive from many providers: numbers as strings, flags as
/// "true"/"1". Anything unreadable becomes `None` instead of failing the
/// whole list.
mod lenient {
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    pub fn number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
        Ok(match Value::deserialize(deserializer)? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().replace(',', "").parse::<f64>().ok(),
            _ => None,
        })
    }

    pub fn flag<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<bool>, D::Error> {
        Ok(match Value::deserialize(deserializer)? {
            Value::Bool(b) => Some(b),
            Value::Number(n) => n.as_i64().map(|n| n != 0),
            Value::String(s) => match s.trim().to_lowercase().as_str() {
                "true" | "yes" | "1" => Some(true),
                "false" | "no" | "0" => Some(false),
                _ => None,
            },
            _ => None,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JobHighlights {
    #[serde(rename = "Qualifications")]
    pub qualifications: Option<Vec<String>>,
    #[serde(rename = "Benefits")]
    pub benefits: Option<Vec<String>>,
}

impl Job {
    pub fn title(&self) -> &str {
        self.job_title.as_deref().unwrap_or("")
    }

    pub fn employer(&self) -> &str {
        self.employer_name.as_deref().unwrap_or("")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedJobRecord {
    pub id: String,
    pub job_id: String,
    pub job_data: Job,
    #[serde(default)]
    pub notes: Option<String>,
    pub saved_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedJobsResponse {
    #[serde(default)]
    pub saved_jobs: Vec<SavedJobRecord>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SortKey {
    #[default]
    Newest,
    Oldest,
    Title,
    Company,
}

impl SortKey {
    pub fn label(self) -> &'static str {
        match self {
            SortKey::Newest => "Newest First",
            SortKey::Oldest => "Oldest First",
            SortKey::Title => "Job Title",
            SortKey::Company => "Company",
        }
    }

    pub fn next(self) -> Self {
        match self {
            SortKey::Newest => SortKey::Oldest,
            SortKey::Oldest => SortKey::Title,
            SortKey::Title => SortKey::Company,
            SortKey::Company => SortKey::Newest,
        }
    }
}
