//! Aggregates behind the product-request dashboard.
//!
//! Everything here works on an in-memory slice of [`RequestRecord`]s so the
//! dashboard can re-filter without fetching again.

use std::collections::{BTreeSet, HashMap, HashSet};

use chrono::{DateTime, Datelike, Local, NaiveDate, SecondsFormat, TimeZone, Utc};

use crate::types::{DEFAULT_STATUS, NOT_PROVIDED, RequestRecord};

/// Label counted for records with an empty grouping field.
pub const UNKNOWN_LABEL: &str = "Unknown";
/// Bars shown per chart.
pub const CHART_LIMIT: usize = 10;
/// Minimum bar width so small counts stay visible.
pub const MIN_BAR_WIDTH_PCT: f64 = 8.0;
/// Products listed in the store-outreach email preview.
pub const EMAIL_PREVIEW_LIMIT: usize = 5;

/// Field a frequency table groups by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestField {
    City,
    Store,
    Product,
}

impl RequestField {
    fn value(self, record: &RequestRecord) -> &str {
        match self {
            Self::City => &record.city,
            Self::Store => &record.store,
            Self::Product => &record.product,
        }
    }
}

/// Headline numbers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RequestStats {
    pub total: usize,
    pub this_month: usize,
    pub unique_stores: usize,
    pub unique_cities: usize,
}

impl RequestStats {
    /// Compute the headline numbers. `month_start` is the first instant of
    /// the current calendar month; records without a usable date do not
    /// count toward `this_month`.
    #[must_use]
    pub fn compute(records: &[RequestRecord], month_start: DateTime<Utc>) -> Self {
        let unique_stores: HashSet<&str> = records.iter().map(|r| r.store.as_str()).collect();
        let unique_cities: HashSet<&str> = records.iter().map(|r| r.city.as_str()).collect();

        Self {
            total: records.len(),
            this_month: count_since(records, month_start),
            unique_stores: unique_stores.len(),
            unique_cities: unique_cities.len(),
        }
    }
}

/// Records submitted at or after `since`.
#[must_use]
pub fn count_since(records: &[RequestRecord], since: DateTime<Utc>) -> usize {
    records
        .iter()
        .filter(|r| r.submitted_at().is_some_and(|at| at >= since))
        .count()
}

/// Midnight on the first of `now`'s month, in `now`'s timezone.
#[must_use]
pub fn month_start<Tz: TimeZone>(now: &DateTime<Tz>) -> DateTime<Utc> {
    let first = NaiveDate::from_ymd_opt(now.year(), now.month(), 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .unwrap_or_default();

    now.timezone()
        .from_local_datetime(&first)
        .earliest()
        .map_or_else(|| first.and_utc(), |dt| dt.with_timezone(&Utc))
}

/// Start of the current month on the server's local clock.
#[must_use]
pub fn local_month_start() -> DateTime<Utc> {
    month_start(&Local::now())
}

/// One row of a ranked frequency table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ranked {
    pub label: String,
    pub count: usize,
}

/// Count records per value of `field`, most frequent first.
///
/// Ties keep first-seen order: the value that appears earliest in
/// `records` ranks higher.
#[must_use]
pub fn rank_by(records: &[RequestRecord], field: RequestField) -> Vec<Ranked> {
    let mut ranked: Vec<Ranked> = Vec::new();
    let mut positions: HashMap<&str, usize> = HashMap::new();

    for record in records {
        let value = field.value(record).trim();
        let label = if value.is_empty() { UNKNOWN_LABEL } else { value };

        if let Some(&pos) = positions.get(label) {
            if let Some(row) = ranked.get_mut(pos) {
                row.count += 1;
            }
        } else {
            positions.insert(label, ranked.len());
            ranked.push(Ranked {
                label: label.to_string(),
                count: 1,
            });
        }
    }

    // `sort_by` is stable, which is what preserves first-seen order on ties.
    ranked.sort_by(|a, b| b.count.cmp(&a.count));
    ranked
}

/// A proportional bar in a CSS bar chart.
#[derive(Debug, Clone, PartialEq)]
pub struct Bar {
    pub label: String,
    pub count: usize,
    pub width_pct: f64,
}

/// Top [`CHART_LIMIT`] rows of a ranking, scaled against the largest count.
#[must_use]
pub fn bar_chart(ranked: &[Ranked]) -> Vec<Bar> {
    let Some(max) = ranked.iter().map(|r| r.count).max().filter(|m| *m > 0) else {
        return Vec::new();
    };

    ranked
        .iter()
        .take(CHART_LIMIT)
        .map(|r| {
            #[allow(clippy::cast_precision_loss)] // Request counts stay far below 2^52
            let pct = r.count as f64 / max as f64 * 100.0;
            Bar {
                label: r.label.clone(),
                count: r.count,
                width_pct: pct.max(MIN_BAR_WIDTH_PCT),
            }
        })
        .collect()
}

/// Lines of the store-outreach email preview: `"Live Rosin - 3 requests"`.
#[must_use]
pub fn email_preview_lines(ranked_products: &[Ranked]) -> Vec<String> {
    ranked_products
        .iter()
        .take(EMAIL_PREVIEW_LIMIT)
        .map(|r| {
            let noun = if r.count == 1 { "request" } else { "requests" };
            format!("{} - {} {noun}", r.label, r.count)
        })
        .collect()
}

/// Client-side style filter over the loaded records.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestFilter {
    /// Case-insensitive substring over the text fields.
    pub search: String,
    /// Exact city; `None` or empty means all.
    pub city: Option<String>,
    /// Exact product; `None` or empty means all.
    pub product: Option<String>,
}

impl RequestFilter {
    #[must_use]
    pub fn matches(&self, record: &RequestRecord) -> bool {
        if non_empty(self.city.as_deref()).is_some_and(|city| record.city != city) {
            return false;
        }

        if non_empty(self.product.as_deref()).is_some_and(|product| record.product != product) {
            return false;
        }

        let search = self.search.trim().to_lowercase();
        if search.is_empty() {
            return true;
        }

        let haystack = format!(
            "{} {} {} {} {} {}",
            record.city, record.store, record.product, record.email, record.instagram, record.date
        )
        .to_lowercase();
        haystack.contains(&search)
    }

    /// Matching records, newest first.
    #[must_use]
    pub fn apply<'a>(&self, records: &'a [RequestRecord]) -> Vec<&'a RequestRecord> {
        let mut matched: Vec<&RequestRecord> = records.iter().filter(|r| self.matches(r)).collect();
        sort_newest_first(&mut matched);
        matched
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Sort by submission time, newest first. Undated records go last.
pub fn sort_newest_first(records: &mut [&RequestRecord]) {
    records.sort_by_key(|r| std::cmp::Reverse(r.submitted_at()));
}

/// Options for the city and product selects.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterOptions {
    pub cities: Vec<String>,
    pub products: Vec<String>,
}

impl FilterOptions {
    #[must_use]
    pub fn from_records(records: &[RequestRecord]) -> Self {
        let distinct = |field: RequestField| -> Vec<String> {
            records
                .iter()
                .map(|r| field.value(r))
                .filter(|v| !v.is_empty())
                .collect::<BTreeSet<_>>()
                .into_iter()
                .map(str::to_string)
                .collect()
        };

        Self {
            cities: distinct(RequestField::City),
            products: distinct(RequestField::Product),
        }
    }
}

/// CSS class for a status badge.
#[must_use]
pub fn status_class(status: &str) -> &'static str {
    if status == DEFAULT_STATUS {
        "status-new"
    } else {
        "status-contacted"
    }
}

/// Fixed records shown when the dashboard runs on a local host.
#[must_use]
pub fn demo_requests(now: DateTime<Local>) -> Vec<RequestRecord> {
    let timestamp = now
        .with_timezone(&Utc)
        .to_rfc3339_opts(SecondsFormat::Millis, true);
    let date = now.format("%-m/%-d/%Y").to_string();

    let rows: [(&str, &str, &str, &str, &str, &str); 5] = [
        ("Portland", "Green Leaf Dispensary", "Live Rosin", "demo@test.com", "user1", "New"),
        ("Portland", "Green Leaf Dispensary", "All-In-One Vapes", NOT_PROVIDED, "user2", "New"),
        ("Eugene", "Herbal Connection", "Live Rosin", "demo2@test.com", NOT_PROVIDED, "New"),
        ("Bend", "Mountain High", "Badder", NOT_PROVIDED, "dabfan", "Contacted"),
        ("Portland", "Rose City Cannabis", "Live Rosin", "fan@test.com", NOT_PROVIDED, "New"),
    ];

    rows.into_iter()
        .map(|(city, store, product, email, instagram, status)| RequestRecord {
            timestamp: timestamp.clone(),
            city: city.to_string(),
            store: store.to_string(),
            product: product.to_string(),
            email: email.to_string(),
            instagram: instagram.to_string(),
            date: date.clone(),
            status: status.to_string(),
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use chrono::FixedOffset;

    use super::*;
    use crate::types::request::sample_request;

    fn at(record: RequestRecord, timestamp: &str) -> RequestRecord {
        RequestRecord {
            timestamp: timestamp.to_string(),
            ..record
        }
    }

    fn five_requests() -> Vec<RequestRecord> {
        vec![
            sample_request("Portland", "Green Leaf", "Live Rosin"),
            sample_request("Portland", "Green Leaf", "Badder"),
            sample_request("Eugene", "Herbal Connection", "Live Rosin"),
            sample_request("Bend", "Mountain High", "All-In-One"),
            sample_request("Portland", "Rose City", "Live Rosin"),
        ]
    }

    #[test]
    fn test_rank_products_most_requested_first() {
        let ranked = rank_by(&five_requests(), RequestField::Product);
        assert_eq!(
            ranked[0],
            Ranked {
                label: "Live Rosin".to_string(),
                count: 3
            }
        );
        assert_eq!(ranked.len(), 3);
    }

    #[test]
    fn test_rank_ties_keep_first_seen_order() {
        let ranked = rank_by(&five_requests(), RequestField::Product);
        let labels: Vec<&str> = ranked.iter().map(|r| r.label.as_str()).collect();
        assert_eq!(labels, vec!["Live Rosin", "Badder", "All-In-One"]);

        let stores = rank_by(&five_requests(), RequestField::Store);
        let labels: Vec<&str> = stores.iter().map(|r| r.label.as_str()).collect();
        assert_eq!(
            labels,
            vec!["Green Leaf", "Herbal Connection", "Mountain High", "Rose City"]
        );
    }

    #[test]
    fn test_rank_blank_values_as_unknown() {
        let records = vec![
            sample_request("", "Green Leaf", "Badder"),
            sample_request("  ", "Green Leaf", "Badder"),
            sample_request("Bend", "Green Leaf", "Badder"),
        ];
        let ranked = rank_by(&records, RequestField::City);
        assert_eq!(ranked[0].label, UNKNOWN_LABEL);
        assert_eq!(ranked[0].count, 2);
    }

    #[test]
    fn test_stats() {
        let mut records = five_requests();
        records[0] = at(records[0].clone(), "2025-02-27T12:00:00Z");

        let month_start = Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap();
        let stats = RequestStats::compute(&records, month_start);

        assert_eq!(
            stats,
            RequestStats {
                total: 5,
                this_month: 4,
                unique_stores: 4,
                unique_cities: 3,
            }
        );
    }

    #[test]
    fn test_month_start_respects_timezone() {
        let tz = FixedOffset::west_opt(7 * 3600).unwrap();
        let now = tz.with_ymd_and_hms(2025, 3, 15, 9, 30, 0).unwrap();
        assert_eq!(
            month_start(&now),
            Utc.with_ymd_and_hms(2025, 3, 1, 7, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_bar_chart_scales_and_clamps() {
        let ranked = vec![
            Ranked {
                label: "Live Rosin".to_string(),
                count: 20,
            },
            Ranked {
                label: "Badder".to_string(),
                count: 10,
            },
            Ranked {
                label: "Sugar".to_string(),
                count: 1,
            },
        ];

        let bars = bar_chart(&ranked);
        assert!((bars[0].width_pct - 100.0).abs() < f64::EPSILON);
        assert!((bars[1].width_pct - 50.0).abs() < f64::EPSILON);
        assert!((bars[2].width_pct - MIN_BAR_WIDTH_PCT).abs() < f64::EPSILON);
    }

    #[test]
    fn test_bar_chart_limit_and_empty() {
        assert!(bar_chart(&[]).is_empty());

        let ranked: Vec<Ranked> = (0..15)
            .map(|i| Ranked {
                label: format!("Store {i}"),
                count: 15 - i,
            })
            .collect();
        assert_eq!(bar_chart(&ranked).len(), CHART_LIMIT);
    }

    #[test]
    fn test_email_preview_lines() {
        let ranked = rank_by(&five_requests(), RequestField::Product);
        assert_eq!(
            email_preview_lines(&ranked),
            vec![
                "Live Rosin - 3 requests",
                "Badder - 1 request",
                "All-In-One - 1 request"
            ]
        );
    }

    #[test]
    fn test_filter_search_is_case_insensitive() {
        let mut records = five_requests();
        records[3].instagram = "DabFan".to_string();

        let filter = RequestFilter {
            search: "dabfan".to_string(),
            ..RequestFilter::default()
        };
        let matched = filter.apply(&records);
        assert_eq!(matched.len(), 1);
        assert_eq!(matched[0].city, "Bend");
    }

    #[test]
    fn test_filter_selects_are_exact() {
        let records = five_requests();
        let filter = RequestFilter {
            city: Some("Portland".to_string()),
            product: Some("Live Rosin".to_string()),
            ..RequestFilter::default()
        };
        assert_eq!(filter.apply(&records).len(), 2);

        let filter = RequestFilter {
            city: Some("portland".to_string()),
            ..RequestFilter::default()
        };
        assert!(filter.apply(&records).is_empty());

        let filter = RequestFilter {
            city: Some(String::new()),
            ..RequestFilter::default()
        };
        assert_eq!(filter.apply(&records).len(), 5);
    }

    #[test]
    fn test_apply_sorts_newest_first() {
        let records = vec![
            at(sample_request("A", "S", "P"), "2025-03-01T00:00:00Z"),
            at(sample_request("B", "S", "P"), "not a date"),
            at(sample_request("C", "S", "P"), "2025-03-09T00:00:00Z"),
        ];
        let mut undated = records;
        undated[1].date = String::new();

        let sorted = RequestFilter::default().apply(&undated);
        let cities: Vec<&str> = sorted.iter().map(|r| r.city.as_str()).collect();
        assert_eq!(cities, vec!["C", "A", "B"]);
    }

    #[test]
    fn test_filter_options_sorted_distinct() {
        let options = FilterOptions::from_records(&five_requests());
        assert_eq!(options.cities, vec!["Bend", "Eugene", "Portland"]);
        assert_eq!(options.products, vec!["All-In-One", "Badder", "Live Rosin"]);
    }

    #[test]
    fn test_status_class() {
        assert_eq!(status_class("New"), "status-new");
        assert_eq!(status_class("Contacted"), "status-contacted");
    }

    #[test]
    fn test_demo_requests() {
        let demo = demo_requests(Local::now());
        assert_eq!(demo.len(), 5);
        assert_eq!(rank_by(&demo, RequestField::Product)[0].label, "Live Rosin");
        assert!(demo.iter().all(|r| r.submitted_at().is_some()));
    }
}
