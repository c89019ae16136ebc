use std::time::Duration;

use plotmap_shared::error::error_detail;
use plotmap_shared::models::{HealthReport, SystemStats};

const DEFAULT_API_URL: &str = "http://localhost:8000";
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const USAGE: &str = "Usage: cargo run -p plotmap-probe -- [--url http://localhost:8000] [--timeout 30]";

fn get_arg(args: &[String], flag: &str) -> Option<String> {
    args.iter().skip_while(|a| *a != flag).nth(1).cloned()
}

fn fetch_health(client: &reqwest::blocking::Client, base: &str) -> Result<HealthReport, String> {
    let url = format!("{base}/health");
    eprintln!("Checking {url}...");
    let resp = client.get(&url).send().map_err(|e| format!("request failed: {e}"))?;
    // 503 still carries a report
    resp.json::<HealthReport>()
        .map_err(|e| format!("unexpected health response: {e}"))
}

fn fetch_stats(client: &reqwest::blocking::Client, base: &str) -> Result<SystemStats, String> {
    let url = format!("{base}/api/stats");
    eprintln!("Fetching {url}...");
    let resp = client.get(&url).send().map_err(|e| format!("request failed: {e}"))?;
    let status = resp.status();
    let body = resp.text().map_err(|e| format!("failed to read body: {e}"))?;
    if !status.is_success() {
        let detail = error_detail(&body).unwrap_or_else(|| status.to_string());
        return Err(format!("stats request failed: {detail}"));
    }
    serde_json::from_str(&body).map_err(|e| format!("unexpected stats response: {e}"))
}

fn format_health(health: &HealthReport) -> String {
    let mut out = String::new();
    out.push_str("=== Health ===\n");
    out.push_str(&format!("  Status:   {}\n", health.status));
    out.push_str(&format!("  Database: {}\n", health.database));
    if let Some(ts) = health.timestamp {
        out.push_str(&format!("  Checked:  {}\n", ts.to_rfc3339()));
    }
    if let Some(err) = &health.error {
        out.push_str(&format!("  Error:    {err}\n"));
    }
    out.push('\n');
    out
}

fn format_stats(stats: &SystemStats) -> String {
    let mut out = String::new();
    out.push_str("=== Plots ===\n");
    out.push_str(&format!("  Total:     {}\n", stats.total_plots));
    out.push_str(&format!("  Available: {}\n", stats.available_plots));
    out.push_str(&format!("  Taken:     {}\n", stats.taken_plots));
    out.push_str(&format!("  Pending:   {}\n", stats.pending_plots));
    out.push_str(&format!("  Area:      {:.2} ha\n\n", stats.total_area_hectares));

    out.push_str("=== Orders ===\n");
    out.push_str(&format!("  Total:     {}\n", stats.total_orders));
    out.push_str(&format!("  Pending:   {}\n", stats.pending_orders));
    out.push_str(&format!("  Approved:  {}\n", stats.approved_orders));
    out.push_str(&format!("  Rejected:  {}\n\n", stats.rejected_orders));

    out.push_str(&format!(
        "=== Coverage ===\n  Districts: {}\n  Wards:     {}\n  Villages:  {}\n",
        stats.districts, stats.wards, stats.villages
    ));
    out
}

fn main() {
    let args: Vec<String> = std::env::args().collect();

    let base = get_arg(&args, "--url")
        .unwrap_or_else(|| DEFAULT_API_URL.to_string())
        .trim_end_matches('/')
        .to_string();

    let timeout = match get_arg(&args, "--timeout") {
        Some(raw) => raw.parse::<u64>().unwrap_or_else(|_| {
            eprintln!("Error: --timeout expects whole seconds, got {raw}");
            eprintln!("{USAGE}");
            std::process::exit(1);
        }),
        None => DEFAULT_TIMEOUT_SECS,
    };

    let client = reqwest::blocking::Client::builder()
        .timeout(Duration::from_secs(timeout))
        .build()
        .unwrap_or_else(|e| {
            eprintln!("Failed to build HTTP client: {e}");
            std::process::exit(1);
        });

    let health = fetch_health(&client, &base).unwrap_or_else(|e| {
        eprintln!("Health check failed: {e}");
        std::process::exit(1);
    });
    print!("{}", format_health(&health));

    match fetch_stats(&client, &base) {
        Ok(stats) => print!("{}", format_stats(&stats)),
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
    }

    if health.status != "healthy" {
        std::process::exit(2);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_get_arg() {
        let argv = args(&["plotmap-probe", "--url", "http://registry:8000", "--timeout", "5"]);
        assert_eq!(get_arg(&argv, "--url").as_deref(), Some("http://registry:8000"));
        assert_eq!(get_arg(&argv, "--timeout").as_deref(), Some("5"));
        assert_eq!(get_arg(&argv, "--missing"), None);
        assert_eq!(get_arg(&args(&["plotmap-probe", "--url"]), "--url"), None);
    }

    #[test]
    fn test_format_unhealthy_report() {
        let report = HealthReport {
            status: "unhealthy".into(),
            database: "disconnected".into(),
            timestamp: None,
            error: Some("database is locked".into()),
        };
        let text = format_health(&report);
        assert!(text.contains("Status:   unhealthy"));
        assert!(text.contains("Error:    database is locked"));
        assert!(!text.contains("Checked"));
    }

    #[test]
    fn test_format_stats() {
        let stats = SystemStats {
            total_plots: 5,
            available_plots: 3,
            taken_plots: 1,
            pending_plots: 1,
            districts: 1,
            wards: 1,
            villages: 1,
            total_area_hectares: 24.6,
            ..Default::default()
        };
        let text = format_stats(&stats);
        assert!(text.contains("Available: 3"));
        assert!(text.contains("Area:      24.60 ha"));
        assert!(text.contains("Villages:  1"));
    }
}
