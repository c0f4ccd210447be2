// Report generation from suite outcomes

use crate::suite::SuiteOutcome;
use serde::{Deserialize, Serialize};
use sitesnap_capture::CaptureResult;
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;
use std::time::Duration;

const RULE: &str = "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReportFormat {
    Text,
    Json,
    Markdown,
}

impl ReportFormat {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "text" => Some(ReportFormat::Text),
            "json" => Some(ReportFormat::Json),
            "markdown" | "md" => Some(ReportFormat::Markdown),
            _ => None,
        }
    }

    pub fn render(&self, outcome: &SuiteOutcome) -> Result<String, serde_json::Error> {
        match self {
            ReportFormat::Text => Ok(generate_text_report(outcome)),
            ReportFormat::Json => generate_json_report(outcome),
            ReportFormat::Markdown => Ok(generate_markdown_report(outcome)),
        }
    }
}

pub fn generate_text_report(outcome: &SuiteOutcome) -> String {
    let mut report = String::new();

    report.push_str(RULE);
    report.push('\n');
    report.push_str("                         SITESNAP SCREENSHOT REPORT\n");
    report.push_str(RULE);
    report.push_str("\n\n");

    report.push_str(&format!("Run ID:       {}\n", outcome.run_id));
    report.push_str(&format!(
        "Started:      {}\n",
        outcome.started_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    report.push_str(&format!("Duration:     {}\n", format_duration(outcome.duration())));
    report.push_str(&format!("Base URL:     {}\n", outcome.base_url));
    report.push_str(&format!("Sitemap:      {}\n", outcome.sitemap));
    report.push('\n');

    report.push_str("# Summary:\n");
    report.push_str(&format!("  Cases run:  {}\n", outcome.results.len()));
    report.push_str(&format!("  Passed:     {}\n", outcome.passed()));
    report.push_str(&format!("  Failed:     {}\n", outcome.failed()));
    report.push('\n');

    if !outcome.collisions.is_empty() {
        report.push_str("# Name collisions:\n");
        for collision in &outcome.collisions {
            report.push_str(&format!(
                "  {} <- {}\n",
                collision.name,
                collision.pathnames.join(", ")
            ));
        }
        report.push('\n');
    }

    report.push_str(RULE);
    report.push_str("\n\n");

    for result in &outcome.results {
        report.push_str(&format_result_line(result));
        report.push('\n');
        if let Some(ref error) = result.error {
            let step = result
                .failed_step
                .map(|s| s.to_string())
                .unwrap_or_else(|| "run".to_string());
            report.push_str(&format!("      at {}: {}\n", step, error));
        }
    }

    report.push('\n');
    report
}

pub fn generate_json_report(outcome: &SuiteOutcome) -> Result<String, serde_json::Error> {
    let json_report = serde_json::json!({
        "report": {
            "metadata": {
                "generator": "Sitesnap",
                "version": env!("CARGO_PKG_VERSION"),
                "generated_at": chrono::Utc::now().to_rfc3339(),
                "format": "json"
            },
            "run": {
                "id": outcome.run_id,
                "started_at": outcome.started_at.to_rfc3339(),
                "finished_at": outcome.finished_at.to_rfc3339(),
                "duration_ms": outcome.duration().as_millis() as u64,
                "base_url": outcome.base_url,
                "sitemap": outcome.sitemap
            },
            "summary": {
                "total": outcome.results.len(),
                "passed": outcome.passed(),
                "failed": outcome.failed()
            },
            "collisions": outcome.collisions,
            "results": outcome.results
        }
    });

    serde_json::to_string_pretty(&json_report)
}

pub fn generate_markdown_report(outcome: &SuiteOutcome) -> String {
    let mut report = String::new();

    report.push_str("# Sitesnap screenshot report\n\n");
    report.push_str(&format!(
        "- **Run:** `{}`\n- **Base URL:** {}\n- **Sitemap:** `{}`\n- **Duration:** {}\n\n",
        outcome.run_id,
        outcome.base_url,
        outcome.sitemap,
        format_duration(outcome.duration())
    ));

    report.push_str(&format!(
        "**{}** passed, **{}** failed of {} case(s).\n\n",
        outcome.passed(),
        outcome.failed(),
        outcome.results.len()
    ));

    if !outcome.collisions.is_empty() {
        report.push_str("## Name collisions\n\n");
        for collision in &outcome.collisions {
            report.push_str(&format!(
                "- `{}`: {}\n",
                collision.name,
                collision
                    .pathnames
                    .iter()
                    .map(|p| format!("`{}`", p))
                    .collect::<Vec<_>>()
                    .join(", ")
            ));
        }
        report.push('\n');
    }

    report.push_str("| Status | Name | Path | Duration | Error |\n");
    report.push_str("|---|---|---|---|---|\n");
    for result in &outcome.results {
        let status = if result.is_passed() { "✓" } else { "✗" };
        let error = match (&result.failed_step, &result.error) {
            (Some(step), Some(error)) => format!("{}: {}", step, error),
            (None, Some(error)) => error.clone(),
            _ => String::new(),
        };
        report.push_str(&format!(
            "| {} | `{}` | `{}` | {} | {} |\n",
            status,
            result.name,
            result.pathname,
            format_duration(result.duration),
            error.replace('|', "\\|")
        ));
    }

    report
}

pub fn save_report(content: &str, path: &Path) -> std::io::Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)?;
    }
    let mut file = File::create(path)?;
    file.write_all(content.as_bytes())?;
    Ok(())
}

fn format_result_line(result: &CaptureResult) -> String {
    let marker = if result.is_passed() { "✓" } else { "✗" };
    format!(
        "  {} {:<40} {} ({})",
        marker,
        result.name,
        result.pathname,
        format_duration(result.duration)
    )
}

fn format_duration(duration: Duration) -> String {
    let millis = duration.as_millis();
    if millis < 1000 {
        format!("{}ms", millis)
    } else {
        format!("{:.1}s", duration.as_secs_f64())
    }
}
