use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;

use crate::models::Job;

const LOGO_SERVICE_URL: &str = "https://logo.clearbit.com";

// (display name, aliases matched case-insensitively)
const SKILL_KEYWORDS: &[(&str, &[&str])] = &[
    ("Rust", &["rust"]),
    ("Python", &["python"]),
    ("JavaScript", &["javascript", "js"]),
    ("TypeScript", &["typescript"]),
    ("Java", &["java"]),
    ("Golang", &["golang"]),
    ("C++", &["c++"]),
    ("C#", &["c#"]),
    ("Ruby", &["ruby", "rails"]),
    ("PHP", &["php"]),
    ("Kotlin", &["kotlin"]),
    ("Scala", &["scala"]),
    ("SQL", &["sql"]),
    ("PostgreSQL", &["postgresql", "postgres"]),
    ("MySQL", &["mysql"]),
    ("MongoDB", &["mongodb", "mongo"]),
    ("Redis", &["redis"]),
    ("GraphQL", &["graphql"]),
    ("React", &["react", "react.js", "reactjs"]),
    ("Angular", &["angular"]),
    ("Vue", &["vue", "vue.js"]),
    ("Node.js", &["node.js", "nodejs"]),
    ("Next.js", &["next.js", "nextjs"]),
    ("Django", &["django"]),
    ("Flask", &["flask"]),
    ("Spring Boot", &["spring boot"]),
    (".NET", &[".net"]),
    ("AWS", &["aws", "amazon web services"]),
    ("Azure", &["azure"]),
    ("GCP", &["gcp", "google cloud"]),
    ("Docker", &["docker"]),
    ("Kubernetes", &["kubernetes", "k8s"]),
    ("Terraform", &["terraform"]),
    ("Linux", &["linux"]),
    ("Git", &["git"]),
    ("CI/CD", &["ci/cd"]),
    ("REST APIs", &["rest api", "rest apis", "restful"]),
    ("Kafka", &["kafka"]),
    ("Spark", &["spark"]),
    ("Machine Learning", &["machine learning"]),
    ("TensorFlow", &["tensorflow"]),
    ("PyTorch", &["pytorch"]),
    ("HTML", &["html"]),
    ("CSS", &["css"]),
    ("Agile", &["agile", "scrum"]),
];

struct SkillPattern {
    name: &'static str,
    regex: Regex,
}

// Keyword boundaries are hand-rolled because `\b` does not work next to
// symbols like "c++" or ".net".
static SKILL_PATTERNS: LazyLock<Vec<SkillPattern>> = LazyLock::new(|| {
    SKILL_KEYWORDS
        .iter()
        .filter_map(|(name, aliases)| {
            let alternation = aliases
                .iter()
                .map(|alias| regex::escape(alias))
                .collect::<Vec<_>>()
                .join("|");
            let pattern = format!(r"(?i)(?:^|[^a-z0-9+#.])(?:{})(?:$|[^a-z0-9+#])", alternation);
            Regex::new(&pattern).ok().map(|regex| SkillPattern { name: *name, regex })
        })
        .collect()
});

/// Skills shown on the card: the explicit list from the snapshot first, then
/// keyword hits over title, description and qualifications in order of first
/// appearance. Case-insensitively deduplicated.
pub fn extract_skills(job: &Job) -> Vec<String> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut skills: Vec<String> = Vec::new();

    for skill in job.job_required_skills.iter().flatten() {
        let skill = skill.trim();
        if !skill.is_empty() && seen.insert(skill.to_lowercase()) {
            skills.push(skill.to_string());
        }
    }

    let text = searchable_text(job);
    let mut hits: Vec<(usize, &'static str)> = SKILL_PATTERNS
        .iter()
        .filter_map(|p| p.regex.find(&text).map(|m| (m.start(), p.name)))
        .collect();
    hits.sort_by_key(|(pos, _)| *pos);

    for (_, name) in hits {
        if seen.insert(name.to_lowercase()) {
            skills.push(name.to_string());
        }
    }

    skills
}

fn searchable_text(job: &Job) -> String {
    let mut parts: Vec<&str> = Vec::new();
    if let Some(title) = &job.job_title {
        parts.push(title);
    }
    if let Some(description) = &job.job_description {
        parts.push(description);
    }
    if let Some(qualifications) = job.job_highlights.as_ref().and_then(|h| h.qualifications.as_ref()) {
        parts.extend(qualifications.iter().map(String::as_str));
    }
    parts.join("\n")
}

/// Cosmetic fit percentage in [0, 100]. Deterministic in the job fields.
pub fn match_score(job: &Job) -> u8 {
    let mut score: u32 = 55; // Base score

    if job.job_min_salary.is_some() || job.job_max_salary.is_some() {
        score += 10;
    }

    if job.job_is_remote == Some(true) {
        score += 8;
    }

    if let Some(kind) = &job.job_employment_type {
        if kind.to_uppercase().replace(['-', '_', ' '], "") == "FULLTIME" {
            score += 5;
        }
    }

    // Up to 15 points for a well-specified stack
    score += (extract_skills(job).len() as u32 * 3).min(15);

    if job.job_description.as_deref().map(str::len).unwrap_or(0) > 400 {
        score += 5;
    }

    if job.job_apply_link.as_deref().is_some_and(|l| !l.trim().is_empty()) {
        score += 2;
    }

    score.min(100) as u8
}

/// Logo for the card: the explicit logo if present, otherwise a lookup by the
/// employer's domain.
pub fn company_logo_url(job: &Job) -> Option<String> {
    if let Some(logo) = job.employer_logo.as_deref().map(str::trim).filter(|l| !l.is_empty()) {
        return Some(logo.to_string());
    }

    let domain = job
        .employer_website
        .as_deref()
        .and_then(domain_from_website)
        .or_else(|| job.employer_name.as_deref().and_then(domain_from_name))?;

    Some(format!("{}/{}", LOGO_SERVICE_URL, domain))
}

fn domain_from_website(website: &str) -> Option<String> {
    let lower = website.trim().to_lowercase();
    let without_scheme = lower
        .strip_prefix("https://")
        .or_else(|| lower.strip_prefix("http://"))
        .unwrap_or(lower.as_str());
    let without_www = without_scheme.strip_prefix("www.").unwrap_or(without_scheme);
    let host = without_www
        .split(|c: char| c == '/' || c == ':' || c == '?' || c == '#')
        .next()
        .unwrap_or("");

    if host.contains('.') && !host.starts_with('.') && !host.ends_with('.') {
        Some(host.to_string())
    } else {
        None
    }
}

fn domain_from_name(name: &str) -> Option<String> {
    let corporate_suffixes = ["inc", "llc", "ltd", "corp", "corporation", "co", "gmbh", "plc"];

    let slug: String = name
        .split_whitespace()
        .map(|w| {
            w.chars()
                .filter(|c| c.is_ascii_alphanumeric())
                .collect::<String>()
                .to_lowercase()
        })
        .filter(|w| !w.is_empty() && !corporate_suffixes.contains(&w.as_str()))
        .collect();

    if slug.is_empty() {
        None
    } else {
        Some(format!("{}.com", slug))
    }
}
