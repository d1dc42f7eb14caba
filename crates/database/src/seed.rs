use crate::connection::{close_after, connect};
use crate::error::DbError;
use crate::repository::{insert_artist, insert_record, insert_sale};
use crate::transaction::rollback;
use chrono::NaiveDate;
use configuration::DbConfig;
use core_types::{ArtistInfo, NewRecord, SaleInfo};
use sqlx::postgres::PgConnection;
use sqlx::Connection;

/// Ids generated while loading the sample data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedSummary {
    pub artist_ids: Vec<i32>,
    /// `record_ids[i]` is the record of `artist_ids[i]`.
    pub record_ids: Vec<i32>,
    pub sale_id: i32,
}

/// One sample artist together with the record they appear on.
struct SampleEntry {
    artist: (&'static str, &'static str, &'static str),
    title: &'static str,
    release_year: i32,
    genres: &'static [&'static str],
}

const SAMPLE_CATALOG: &[SampleEntry] = &[
    SampleEntry {
        artist: ("Aimer", "chen", "Chino"),
        title: "Deep Down",
        release_year: 2022,
        genres: &["Pop", "Anime", "Rock"],
    },
    SampleEntry {
        artist: ("David", "Gonzalez", "Portugues"),
        title: "Chainsaw Blood",
        release_year: 2022,
        genres: &["Rock", "J-Pop"],
    },
    SampleEntry {
        artist: ("Antonio", "Gutierrez", "Español"),
        title: "KICK BACK",
        release_year: 2022,
        genres: &["K-Pop", "Rock"],
    },
    SampleEntry {
        artist: ("Hironobu", "Kageyama", "Japonesa"),
        title: "Cha-La Head-Cha-La",
        release_year: 1989,
        genres: &["Anisong", "Classic"],
    },
];

const SAMPLE_CUSTOMER: &str = "Juan Pérez";
/// The sample sale buys this many of the first catalog records.
const SAMPLE_SALE_RECORDS: usize = 2;

fn sample_sale_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 1, 15).unwrap_or_default()
}

/// Inserts the sample catalog and one sale in a single transaction.
///
/// Records reference the artist ids returned by the inserts and the sale
/// references the returned record ids, so the data is consistent whatever
/// the sequences currently hold. Any failure rolls back the whole batch.
pub async fn load_sample_data(conn: &mut PgConnection) -> Result<SeedSummary, DbError> {
    tracing::info!(artists = SAMPLE_CATALOG.len(), "Loading sample data.");
    let mut tx = conn.begin().await?;

    match insert_catalog(&mut tx).await {
        Ok(summary) => {
            tx.commit().await?;
            tracing::info!(sale_id = summary.sale_id, records = ?summary.record_ids, "Sample data loaded.");
            Ok(summary)
        }
        Err(e) => {
            tracing::error!(kind = ?e.kind(), error = %e, "Failed to load sample data.");
            rollback(tx, "load_sample_data").await;
            Err(e)
        }
    }
}

/// Opens its own connection, runs [`load_sample_data`] and always closes the connection.
pub async fn load_sample_data_with_config(config: &DbConfig) -> Result<SeedSummary, DbError> {
    let mut conn = connect(config).await?;
    let result = load_sample_data(&mut conn).await;
    close_after(conn, result).await
}

async fn insert_catalog(conn: &mut PgConnection) -> Result<SeedSummary, DbError> {
    let mut artist_ids = Vec::with_capacity(SAMPLE_CATALOG.len());
    let mut record_ids = Vec::with_capacity(SAMPLE_CATALOG.len());

    for entry in SAMPLE_CATALOG {
        let (first_name, last_name, nationality) = entry.artist;
        let artist_id = insert_artist(conn, &ArtistInfo::new(first_name, last_name, nationality)).await?;
        let record = NewRecord::new(entry.title, entry.release_year, entry.genres, vec![artist_id]);
        let record_id = insert_record(conn, &record).await?;

        tracing::debug!(artist_id, record_id, title = entry.title, "Inserted sample entry.");
        artist_ids.push(artist_id);
        record_ids.push(record_id);
    }

    let purchased = record_ids.iter().take(SAMPLE_SALE_RECORDS).copied().collect();
    let sale = SaleInfo::new(SAMPLE_CUSTOMER, sample_sale_date(), purchased)?;
    let sale_id = insert_sale(conn, &sale).await?;

    Ok(SeedSummary {
        artist_ids,
        record_ids,
        sale_id,
    })
}
