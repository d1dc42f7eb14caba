use crate::error::CoreError;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// The `artist_type` composite: who an artist is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtistInfo {
    pub first_name: String,
    pub last_name: String,
    pub nationality: String,
}

impl ArtistInfo {
    pub fn new(
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        nationality: impl Into<String>,
    ) -> Self {
        Self {
            first_name: first_name.into(),
            last_name: last_name.into(),
            nationality: nationality.into(),
        }
    }
}

/// A record (album) that has not been inserted yet.
///
/// `artist_ids` is a plain id list; nothing in the base schema checks that
/// the artists exist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewRecord {
    pub title: String,
    pub release_year: i32,
    pub genres: Vec<String>,
    pub artist_ids: Vec<i32>,
}

impl NewRecord {
    pub fn new(title: impl Into<String>, release_year: i32, genres: &[&str], artist_ids: Vec<i32>) -> Self {
        Self {
            title: title.into(),
            release_year,
            genres: genres.iter().map(|g| g.to_string()).collect(),
            artist_ids,
        }
    }
}

/// The `sale_info` composite: who bought which records and when.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleInfo {
    pub customer_name: String,
    pub sale_date: NaiveDate,
    pub record_ids: Vec<i32>,
}

impl SaleInfo {
    /// Builds a sale, rejecting one that references no records.
    pub fn new(
        customer_name: impl Into<String>,
        sale_date: NaiveDate,
        record_ids: Vec<i32>,
    ) -> Result<Self, CoreError> {
        if record_ids.is_empty() {
            return Err(CoreError::InvalidInput(
                "record_ids".to_string(),
                "a sale must reference at least one record".to_string(),
            ));
        }
        Ok(Self {
            customer_name: customer_name.into(),
            sale_date,
            record_ids,
        })
    }
}

/// Name and nationality of an artist, as projected out of `artist_type`.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct ArtistSummary {
    pub first_name: String,
    pub nationality: String,
}

/// The results of the fixed report batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportSet {
    /// Titles of records tagged with the report genre.
    pub rock_titles: Vec<String>,
    /// Record ids bought by the report customer; `None` when there is no such sale.
    pub purchased_record_ids: Option<Vec<i32>>,
    /// Artists referenced by the report record.
    pub record_artists: Vec<ArtistSummary>,
}

/// An id in a reference array that points at a row that does not exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct OrphanedReference {
    /// Id of the row holding the array.
    pub owner_id: i32,
    /// The id inside the array with no matching row.
    pub missing_id: i32,
}

/// Result of auditing the unenforced id arrays.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrphanReport {
    pub records_missing_artists: Vec<OrphanedReference>,
    pub sales_missing_records: Vec<OrphanedReference>,
}

impl OrphanReport {
    pub fn is_clean(&self) -> bool {
        self.records_missing_artists.is_empty() && self.sales_missing_records.is_empty()
    }
}
