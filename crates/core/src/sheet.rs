//! Mapping spreadsheet tabs onto records by header name.
//!
//! A tab arrives as a grid of strings whose first row is the header. Each
//! record type declares the columns it needs ([`FromSheetRow::COLUMNS`]);
//! [`SheetTable::project`] resolves those names against the header once and
//! then reads every data row through the resulting map. Reordering columns
//! in the sheet is harmless; deleting or renaming a required one fails the
//! whole projection with [`SchemaMismatch`].

use thiserror::Error;

use crate::types::{DEFAULT_STATUS, NOT_PROVIDED, RequestRecord, StoreRecord};

/// A required column could not be found in the header row.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("sheet is missing required columns: {}", .missing.join(", "))]
pub struct SchemaMismatch {
    pub missing: Vec<&'static str>,
}

/// A single data row could not be turned into a record.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RowError {
    #[error("column {column} is not a number: {value:?}")]
    InvalidNumber { column: &'static str, value: String },

    #[error("column {column} is out of range: {value}")]
    OutOfRange { column: &'static str, value: String },
}

/// A column a record type reads.
#[derive(Debug, Clone, Copy)]
pub struct Column {
    /// Canonical name, also used as the lookup key in [`SheetRow::get`].
    pub field: &'static str,
    /// Other header spellings accepted for this column.
    pub aliases: &'static [&'static str],
    pub required: bool,
}

impl Column {
    #[must_use]
    pub const fn required(field: &'static str, aliases: &'static [&'static str]) -> Self {
        Self {
            field,
            aliases,
            required: true,
        }
    }

    #[must_use]
    pub const fn optional(field: &'static str, aliases: &'static [&'static str]) -> Self {
        Self {
            field,
            aliases,
            required: false,
        }
    }

    fn matches(&self, normalized_header: &str) -> bool {
        normalize(self.field) == normalized_header
            || self.aliases.iter().any(|a| normalize(a) == normalized_header)
    }
}

/// Record types that can be read from a sheet row.
pub trait FromSheetRow: Sized {
    const COLUMNS: &'static [Column];

    /// Build a record from one data row.
    ///
    /// # Errors
    ///
    /// Returns a [`RowError`] when a cell cannot be converted.
    fn from_row(row: &SheetRow<'_>) -> Result<Self, RowError>;
}

/// Header row plus data rows of one tab.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SheetTable {
    header: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl SheetTable {
    /// Split raw tab values into header and data rows.
    #[must_use]
    pub fn from_values(values: Vec<Vec<String>>) -> Self {
        let mut values = values.into_iter();
        let header = values.next().unwrap_or_default();
        Self {
            header,
            rows: values.collect(),
        }
    }

    #[must_use]
    pub fn header(&self) -> &[String] {
        &self.header
    }

    /// Number of data rows (header excluded, blank rows included).
    #[must_use]
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Whether at least one row follows the header.
    #[must_use]
    pub fn has_data(&self) -> bool {
        !self.rows.is_empty()
    }

    /// Project every non-blank data row into `T`.
    ///
    /// A tab with no data rows projects to an empty result without
    /// consulting the header.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaMismatch`] if a required column is absent from the
    /// header. Row-level failures do not fail the projection; they are
    /// collected in [`Projection::rejected`].
    pub fn project<T: FromSheetRow>(&self) -> Result<Projection<T>, SchemaMismatch> {
        if !self.has_data() {
            return Ok(Projection::default());
        }

        let map = ColumnMap::resolve(&self.header, T::COLUMNS)?;
        let mut projection = Projection::default();

        for (i, cells) in self.rows.iter().enumerate() {
            if cells.iter().all(|c| c.trim().is_empty()) {
                continue;
            }

            let row = SheetRow {
                cells,
                map: &map,
                columns: T::COLUMNS,
            };

            match T::from_row(&row) {
                Ok(record) => projection.records.push(record),
                Err(error) => projection.rejected.push(RejectedRow {
                    // 1-based, counting the header row, as shown in the sheet UI.
                    row: i + 2,
                    error,
                }),
            }
        }

        Ok(projection)
    }
}

/// Result of projecting a tab.
#[derive(Debug, Clone, PartialEq)]
pub struct Projection<T> {
    pub records: Vec<T>,
    pub rejected: Vec<RejectedRow>,
}

impl<T> Default for Projection<T> {
    fn default() -> Self {
        Self {
            records: Vec::new(),
            rejected: Vec::new(),
        }
    }
}

/// A data row that was skipped, with its sheet row number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedRow {
    pub row: usize,
    pub error: RowError,
}

/// Header positions for each declared column, in declaration order.
#[derive(Debug, Clone)]
pub struct ColumnMap {
    slots: Vec<Option<usize>>,
}

impl ColumnMap {
    /// Locate each column in `header`. The first matching header cell wins.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaMismatch`] naming every required column not found.
    pub fn resolve(header: &[String], columns: &[Column]) -> Result<Self, SchemaMismatch> {
        let normalized: Vec<String> = header.iter().map(|h| normalize(h)).collect();

        let slots: Vec<Option<usize>> = columns
            .iter()
            .map(|column| normalized.iter().position(|h| column.matches(h)))
            .collect();

        let missing: Vec<&'static str> = columns
            .iter()
            .zip(&slots)
            .filter(|(column, slot)| column.required && slot.is_none())
            .map(|(column, _)| column.field)
            .collect();

        if missing.is_empty() {
            Ok(Self { slots })
        } else {
            Err(SchemaMismatch { missing })
        }
    }
}

/// One data row viewed through a [`ColumnMap`].
#[derive(Debug)]
pub struct SheetRow<'a> {
    cells: &'a [String],
    map: &'a ColumnMap,
    columns: &'static [Column],
}

impl SheetRow<'_> {
    /// Trimmed cell for `field`, or `""` when the column is absent or the
    /// row is shorter than the header.
    #[must_use]
    pub fn get(&self, field: &str) -> &str {
        self.columns
            .iter()
            .position(|c| c.field == field)
            .and_then(|i| self.map.slots.get(i).copied().flatten())
            .and_then(|idx| self.cells.get(idx))
            .map_or("", |cell| cell.trim())
    }

    /// Cell for `field`, or `default` when blank.
    #[must_use]
    pub fn get_or<'b>(&'b self, field: &str, default: &'b str) -> &'b str {
        let value = self.get(field);
        if value.is_empty() { default } else { value }
    }

    /// Cell for `field` parsed as a float.
    ///
    /// # Errors
    ///
    /// Returns [`RowError::InvalidNumber`] if the cell is blank or not numeric.
    pub fn get_f64(&self, field: &'static str) -> Result<f64, RowError> {
        let value = self.get(field);
        value
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .ok_or_else(|| RowError::InvalidNumber {
                column: field,
                value: value.to_string(),
            })
    }
}

/// Lowercase and drop everything but letters and digits, so that
/// `"Zip Code"`, `"zip_code"` and `"ZIPCODE"` compare equal.
fn normalize(header: &str) -> String {
    header
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

// =============================================================================
// Sheet schemas
// =============================================================================

impl FromSheetRow for StoreRecord {
    const COLUMNS: &'static [Column] = &[
        Column::required("state", &["region", "province"]),
        Column::required("name", &["store", "store name"]),
        Column::required("address", &["street", "street address"]),
        Column::required("city", &[]),
        Column::required("zip", &["zip code", "postal code", "postal"]),
        Column::required("phone", &["phone number", "telephone"]),
        Column::required("latitude", &["lat"]),
        Column::required("longitude", &["lng", "lon", "long"]),
    ];

    fn from_row(row: &SheetRow<'_>) -> Result<Self, RowError> {
        let latitude = row.get_f64("latitude")?;
        if !(-90.0..=90.0).contains(&latitude) {
            return Err(RowError::OutOfRange {
                column: "latitude",
                value: latitude.to_string(),
            });
        }

        let longitude = row.get_f64("longitude")?;
        if !(-180.0..=180.0).contains(&longitude) {
            return Err(RowError::OutOfRange {
                column: "longitude",
                value: longitude.to_string(),
            });
        }

        Ok(Self {
            state: row.get("state").to_string(),
            name: row.get("name").to_string(),
            address: row.get("address").to_string(),
            city: row.get("city").to_string(),
            zip: row.get("zip").to_string(),
            phone: row.get("phone").to_string(),
            latitude,
            longitude,
        })
    }
}

impl FromSheetRow for RequestRecord {
    const COLUMNS: &'static [Column] = &[
        Column::required("timestamp", &["submitted at", "submitted"]),
        Column::required("city", &[]),
        Column::required("store", &["store name", "dispensary"]),
        Column::required("product", &[]),
        Column::optional("email", &["email address"]),
        Column::optional("instagram", &["instagram handle", "ig"]),
        Column::optional("date", &["display date"]),
        Column::optional("status", &[]),
    ];

    fn from_row(row: &SheetRow<'_>) -> Result<Self, RowError> {
        Ok(Self {
            timestamp: row.get("timestamp").to_string(),
            city: row.get("city").to_string(),
            store: row.get("store").to_string(),
            product: row.get("product").to_string(),
            email: row.get_or("email", NOT_PROVIDED).to_string(),
            instagram: row.get_or("instagram", NOT_PROVIDED).to_string(),
            date: row.get("date").to_string(),
            status: row.get_or("status", DEFAULT_STATUS).to_string(),
        })
    }
}
