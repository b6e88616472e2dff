use anyhow::{anyhow, Context, Result};
use std::process::{Command, Stdio};
use tracing::info;

/// Opens an apply link in the user's default browser. Only http(s) links are
/// handed to the system launcher.
pub fn open_url(url: &str) -> Result<()> {
    let url = validate_url(url)?;
    let (program, args) = launcher_for(std::env::consts::OS, url);

    info!(url, program, "opening link in browser");
    Command::new(program)
        .args(&args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .with_context(|| format!("Failed to launch '{}' to open {}", program, url))?;

    Ok(())
}

fn validate_url(url: &str) -> Result<&str> {
    let url = url.trim();
    let lower = url.to_lowercase();
    if lower.starts_with("https://") || lower.starts_with("http://") {
        Ok(url)
    } else if url.is_empty() {
        Err(anyhow!("No apply link for this job"))
    } else {
        Err(anyhow!("Refusing to open non-http link: {}", url))
    }
}

/// The URL is always a single argv entry; no shell ever parses it.
fn launcher_for(os: &str, url: &str) -> (&'static str, Vec<String>) {
    match os {
        "macos" => ("open", vec![url.to_string()]),
        "windows" => (
            "rundll32",
            vec!["url.dll,FileProtocolHandler".to_string(), url.to_string()],
        ),
        _ => ("xdg-open", vec![url.to_string()]),
    }
}
