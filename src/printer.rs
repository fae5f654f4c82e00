use base64::{engine::general_purpose::STANDARD, Engine as _};
use colored::{Color, Colorize};

use crate::executor::{ExecutionResult, Outcome, ResponseDataType};
use crate::runner::{RunReport, Summary};

fn status_color(status: u16) -> Color {
    if status >= 400 {
        Color::Red
    } else if status >= 300 {
        Color::Yellow
    } else {
        Color::Green
    }
}

pub fn print_report(report: &RunReport, preview_bytes: Option<usize>) {
    for result in &report.results {
        print_execution_result(result, preview_bytes);
        println!();
    }
    print_summary(&report.summary);
}

pub fn print_execution_result(result: &ExecutionResult, preview_bytes: Option<usize>) {
    let badge = match result.outcome() {
        Outcome::Passed => "PASS".green().bold(),
        Outcome::Failed => "FAIL".red().bold(),
        Outcome::Blocked => "BLOCKED".magenta().bold(),
    };
    let title = match &result.scenario_name {
        Some(scenario) => format!("{} [{}]", result.test_name, scenario),
        None => result.test_name.clone(),
    };
    println!(
        "{} {} {}",
        badge,
        title.bold(),
        format!("({} · {})", result.test_id, result.category).dimmed()
    );

    if let Some(status) = result.status_code {
        let timing = result
            .response_time_ms
            .map(|ms| format!("({ms:.1} ms)"))
            .unwrap_or_default();
        println!(
            "  {} {} {}",
            "Status:".bold(),
            status.to_string().color(status_color(status)),
            timing.dimmed()
        );
    }

    if let Some(error) = &result.error {
        println!("  {} {}", "Error:".bold(), error.red());
    }

    if let Some(preview) = preview_bytes
        .filter(|limit| *limit > 0)
        .and_then(|limit| response_preview(result, limit))
    {
        println!("  {}", "Preview".bold());
        println!("{}", preview.dimmed());
    }
}

pub fn print_summary(summary: &Summary) {
    println!(
        "{} {} total, {} passed, {} failed, {} blocked",
        "Summary:".bold(),
        summary.total,
        summary.passed.to_string().green(),
        summary.failed.to_string().red(),
        summary.blocked.to_string().magenta()
    );
    if let Some(average) = summary.avg_response_time_ms {
        println!(
            "{} {}",
            "Average response time:".bold(),
            format!("{average:.2} ms").dimmed()
        );
    }
}

fn response_preview(result: &ExecutionResult, limit: usize) -> Option<String> {
    let data = result.response_data.as_ref()?;
    let bytes = match (result.response_data_type?, data) {
        (ResponseDataType::Binary, serde_json::Value::String(encoded)) => {
            STANDARD.decode(encoded).ok()?
        }
        (ResponseDataType::Text, serde_json::Value::String(text)) => text.as_bytes().to_vec(),
        _ => serde_json::to_vec_pretty(data).ok()?,
    };
    Some(create_preview(&bytes, limit))
}

/// First `limit` bytes as text, or hex when they are not valid UTF-8.
pub fn create_preview(bytes: &[u8], limit: usize) -> String {
    let slice = if bytes.len() > limit {
        &bytes[..limit]
    } else {
        bytes
    };
    match std::str::from_utf8(slice) {
        Ok(text) => text.to_string(),
        Err(_) => hex::encode(slice),
    }
}
