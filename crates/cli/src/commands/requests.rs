//! `dabs-cli requests` - reports over the ProductRequests tab.

use dabs_core::RequestRecord;
use dabs_core::dashboard::{
    CHART_LIMIT, RequestField, RequestFilter, RequestStats, email_preview_lines, local_month_start,
    rank_by,
};
use dabs_site::sheets::Freshness;

use super::{CliError, emit, sheets_from_env};

async fn load() -> Result<Vec<RequestRecord>, CliError> {
    let (_, sheets) = sheets_from_env()?;
    Ok(sheets.requests(Freshness::Fresh).await?)
}

/// Print headline numbers, top rankings and the outreach email preview.
///
/// # Errors
///
/// Returns `CliError` if the sheet cannot be read.
pub async fn summary() -> Result<(), CliError> {
    let records = load().await?;
    emit(&render_summary(&records, RequestStats::compute(&records, local_month_start())));
    Ok(())
}

/// Print requests matching `search`, newest first.
///
/// # Errors
///
/// Returns `CliError` if the sheet cannot be read.
pub async fn list(search: String) -> Result<(), CliError> {
    let records = load().await?;
    let filter = RequestFilter {
        search,
        ..RequestFilter::default()
    };
    emit(&render_list(&filter.apply(&records)));
    Ok(())
}

fn render_summary(records: &[RequestRecord], stats: RequestStats) -> Vec<String> {
    let mut lines = vec![
        format!("Total requests: {}", stats.total),
        format!("This month:     {}", stats.this_month),
        format!("Unique stores:  {}", stats.unique_stores),
        format!("Unique cities:  {}", stats.unique_cities),
    ];

    let products = rank_by(records, RequestField::Product);
    for (title, ranked) in [
        ("Top stores", rank_by(records, RequestField::Store)),
        ("Top cities", rank_by(records, RequestField::City)),
        ("Top products", products.clone()),
    ] {
        lines.push(String::new());
        lines.push(format!("{title}:"));
        lines.extend(
            ranked
                .iter()
                .take(CHART_LIMIT)
                .map(|r| format!("  {:>4}  {}", r.count, r.label)),
        );
    }

    let preview = email_preview_lines(&products);
    if !preview.is_empty() {
        lines.push(String::new());
        lines.push("Email preview:".to_string());
        lines.extend(preview.into_iter().map(|line| format!("  {line}")));
    }

    lines
}

fn render_list(records: &[&RequestRecord]) -> Vec<String> {
    if records.is_empty() {
        return vec!["No requests found".to_string()];
    }

    records
        .iter()
        .map(|r| {
            format!(
                "{} | {} | {} | {} | {} | {}",
                r.date, r.city, r.store, r.product, r.email, r.status
            )
        })
        .collect()
}
