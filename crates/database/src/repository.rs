use crate::error::DbError;
use crate::transaction::rollback;
use chrono::NaiveDate;
use core_types::{ArtistInfo, ArtistSummary, Entity, NewRecord, OrphanReport, OrphanedReference, ReportSet, SaleInfo};
use sqlx::postgres::{PgArguments, PgConnection};
use sqlx::query::Query;
use sqlx::{Connection, Postgres};

/// Genre looked up by the fixed "records in a genre" report.
pub const REPORT_GENRE: &str = "Rock";
/// Customer whose purchases the fixed report lists.
pub const REPORT_CUSTOMER: &str = "Juan Pérez";
/// Record whose artists the fixed report lists.
pub const REPORT_RECORD_ID: i32 = 1;

/// The `DbRepository` provides a high-level, application-specific interface
/// to the database. It encapsulates all SQL queries and data access logic.
///
/// It borrows a single connection exclusively. Every write runs in its own
/// transaction that is committed on success and rolled back on any failure;
/// nothing is atomic across calls.
#[derive(Debug)]
pub struct DbRepository<'c> {
    conn: &'c mut PgConnection,
}

impl<'c> DbRepository<'c> {
    /// Creates a new `DbRepository` over an open connection.
    pub fn new(conn: &'c mut PgConnection) -> Self {
        Self { conn }
    }

    /// Records a sale of one or more records and returns its id.
    ///
    /// An empty `record_ids` is rejected before any statement is sent, so no
    /// transaction is opened for it.
    pub async fn create_sale(
        &mut self,
        customer_name: &str,
        sale_date: NaiveDate,
        record_ids: &[i32],
    ) -> Result<i32, DbError> {
        let sale = match SaleInfo::new(customer_name, sale_date, record_ids.to_vec()) {
            Ok(sale) => sale,
            Err(e) => {
                tracing::warn!(customer = customer_name, error = %e, "Rejected sale without records.");
                return Err(e.into());
            }
        };

        let mut tx = self.conn.begin().await?;
        match insert_sale(&mut tx, &sale).await {
            Ok(sale_id) => {
                tx.commit().await?;
                tracing::info!(sale_id, customer = customer_name, records = ?sale.record_ids, "Sale recorded.");
                Ok(sale_id)
            }
            Err(e) => {
                tracing::error!(customer = customer_name, kind = ?e.kind(), error = %e, "Failed to record sale.");
                rollback(tx, "create_sale").await;
                Err(e)
            }
        }
    }

    /// Replaces the genre set of a record.
    ///
    /// Fails with `NotFound` and leaves the table untouched when no record has `record_id`.
    pub async fn update_genres(&mut self, record_id: i32, genres: &[String]) -> Result<(), DbError> {
        let query = sqlx::query("UPDATE discos SET generos = $1 WHERE id_disco = $2")
            .bind(genres)
            .bind(record_id);
        self.execute_keyed("update_genres", Entity::Record, record_id, query).await?;
        tracing::info!(record_id, genres = ?genres, "Record genres updated.");
        Ok(())
    }

    /// Deletes an artist by id.
    ///
    /// Fails with `NotFound` when the artist does not exist, and with
    /// `Integrity` when the engine refuses because other rows depend on it.
    pub async fn delete_artist(&mut self, artist_id: i32) -> Result<(), DbError> {
        let query = sqlx::query("DELETE FROM artistas WHERE id_artista = $1").bind(artist_id);
        match self.execute_keyed("delete_artist", Entity::Artist, artist_id, query).await {
            Ok(()) => {
                tracing::info!(artist_id, "Artist deleted.");
                Ok(())
            }
            Err(e @ DbError::Integrity(_)) => {
                tracing::warn!(artist_id, error = %e, "Artist is still referenced; delete rolled back.");
                Err(e)
            }
            Err(e) => Err(e),
        }
    }

    /// Runs a single-row mutation keyed by id in its own transaction.
    ///
    /// Zero affected rows is a lookup failure and is rolled back rather than
    /// committed as a no-op.
    async fn execute_keyed(
        &mut self,
        operation: &'static str,
        entity: Entity,
        id: i32,
        query: Query<'_, Postgres, PgArguments>,
    ) -> Result<(), DbError> {
        let mut tx = self.conn.begin().await?;

        match query.execute(&mut *tx).await {
            Ok(done) if done.rows_affected() == 0 => {
                tracing::warn!(operation, table = entity.table(), id, "No row matched; nothing changed.");
                rollback(tx, operation).await;
                Err(DbError::NotFound { entity, id })
            }
            Ok(done) => {
                tx.commit().await?;
                tracing::debug!(operation, %entity, id, rows = done.rows_affected(), "Committed.");
                Ok(())
            }
            Err(e) => {
                let e = DbError::from(e);
                tracing::error!(operation, %entity, id, kind = ?e.kind(), error = %e, "Statement failed.");
                rollback(tx, operation).await;
                Err(e)
            }
        }
    }

    /// Inserts an artist and returns the generated id.
    pub async fn add_artist(&mut self, artist: &ArtistInfo) -> Result<i32, DbError> {
        insert_artist(&mut *self.conn, artist).await
    }

    /// Inserts a record and returns the generated id.
    pub async fn add_record(&mut self, record: &NewRecord) -> Result<i32, DbError> {
        insert_record(&mut *self.conn, record).await
    }

    /// Runs the three fixed reports.
    ///
    /// The first failing query aborts the batch; no partial results are returned.
    pub async fn run_reports(&mut self) -> Result<ReportSet, DbError> {
        let result = self.collect_reports().await;
        if let Err(e) = &result {
            tracing::error!(kind = ?e.kind(), error = %e, "Report batch aborted.");
        }
        result
    }

    async fn collect_reports(&mut self) -> Result<ReportSet, DbError> {
        let rock_titles = self.records_with_genre(REPORT_GENRE).await?;
        let purchased_record_ids = self.purchased_records_for(REPORT_CUSTOMER).await?;
        let record_artists = self.artists_of_record(REPORT_RECORD_ID).await?;

        Ok(ReportSet {
            rock_titles,
            purchased_record_ids,
            record_artists,
        })
    }

    /// Titles of the records whose genre set contains `genre`.
    pub async fn records_with_genre(&mut self, genre: &str) -> Result<Vec<String>, DbError> {
        let titles = sqlx::query_scalar::<_, String>(
            "SELECT titulo FROM discos WHERE $1 = ANY (generos) ORDER BY id_disco",
        )
        .bind(genre)
        .fetch_all(&mut *self.conn)
        .await?;
        Ok(titles)
    }

    /// The record ids bought by `customer_name`, from their first sale.
    pub async fn purchased_records_for(&mut self, customer_name: &str) -> Result<Option<Vec<i32>>, DbError> {
        let ids = sqlx::query_scalar::<_, Option<Vec<i32>>>(
            r#"
            SELECT (detalle).discos_comprados
            FROM ventas
            WHERE (detalle).customer_name = $1
            ORDER BY id_venta
            LIMIT 1
            "#,
        )
        .bind(customer_name)
        .fetch_optional(&mut *self.conn)
        .await?;
        Ok(ids.flatten())
    }

    /// Name and nationality of every artist listed in a record's `artistas_ids`.
    pub async fn artists_of_record(&mut self, record_id: i32) -> Result<Vec<ArtistSummary>, DbError> {
        // unnest() turns the id array into rows so ANY can match against them.
        let artists = sqlx::query_as::<_, ArtistSummary>(
            r#"
            SELECT (info).nombre AS first_name, (info).nacionalidad AS nationality
            FROM artistas
            WHERE id_artista = ANY (
                SELECT unnest(artistas_ids) FROM discos WHERE id_disco = $1
            )
            ORDER BY id_artista
            "#,
        )
        .bind(record_id)
        .fetch_all(&mut *self.conn)
        .await?;
        Ok(artists)
    }

    /// Number of sales stored for `customer_name`.
    pub async fn count_sales_for(&mut self, customer_name: &str) -> Result<i64, DbError> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM ventas WHERE (detalle).customer_name = $1",
        )
        .bind(customer_name)
        .fetch_one(&mut *self.conn)
        .await?;
        Ok(count)
    }

    /// The genre set of a record, or `None` when the record does not exist.
    pub async fn record_genres(&mut self, record_id: i32) -> Result<Option<Vec<String>>, DbError> {
        let genres = sqlx::query_scalar::<_, Option<Vec<String>>>(
            "SELECT generos FROM discos WHERE id_disco = $1",
        )
        .bind(record_id)
        .fetch_optional(&mut *self.conn)
        .await?;
        Ok(genres.map(Option::unwrap_or_default))
    }

    pub async fn artist_exists(&mut self, artist_id: i32) -> Result<bool, DbError> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM artistas WHERE id_artista = $1)",
        )
        .bind(artist_id)
        .fetch_one(&mut *self.conn)
        .await?;
        Ok(exists)
    }

    /// Lists ids in the reference arrays that point at missing rows.
    ///
    /// Read-only: it reports dangling references, it never repairs them.
    pub async fn find_orphaned_references(&mut self) -> Result<OrphanReport, DbError> {
        let records_missing_artists = sqlx::query_as::<_, OrphanedReference>(
            r#"
            SELECT d.id_disco AS owner_id, elem.id AS missing_id
            FROM discos d
            CROSS JOIN LATERAL unnest(d.artistas_ids) AS elem(id)
            WHERE NOT EXISTS (SELECT 1 FROM artistas a WHERE a.id_artista = elem.id)
            ORDER BY d.id_disco, elem.id
            "#,
        )
        .fetch_all(&mut *self.conn)
        .await?;

        let sales_missing_records = sqlx::query_as::<_, OrphanedReference>(
            r#"
            SELECT v.id_venta AS owner_id, elem.id AS missing_id
            FROM ventas v
            CROSS JOIN LATERAL unnest((v.detalle).discos_comprados) AS elem(id)
            WHERE NOT EXISTS (SELECT 1 FROM discos d WHERE d.id_disco = elem.id)
            ORDER BY v.id_venta, elem.id
            "#,
        )
        .fetch_all(&mut *self.conn)
        .await?;

        let report = OrphanReport {
            records_missing_artists,
            sales_missing_records,
        };
        if !report.is_clean() {
            tracing::warn!(
                records = report.records_missing_artists.len(),
                sales = report.sales_missing_records.len(),
                "Found dangling references."
            );
        }
        Ok(report)
    }
}

// Composite values are built with ROW(..)::type so the driver only ever
// binds scalars and arrays.

pub(crate) async fn insert_artist(conn: &mut PgConnection, artist: &ArtistInfo) -> Result<i32, DbError> {
    let id = sqlx::query_scalar::<_, i32>(
        r#"
        INSERT INTO artistas (info)
        VALUES (ROW($1::varchar, $2::varchar, $3::varchar)::artist_type)
        RETURNING id_artista
        "#,
    )
    .bind(&artist.first_name)
    .bind(&artist.last_name)
    .bind(&artist.nationality)
    .fetch_one(conn)
    .await?;
    Ok(id)
}

pub(crate) async fn insert_record(conn: &mut PgConnection, record: &NewRecord) -> Result<i32, DbError> {
    let id = sqlx::query_scalar::<_, i32>(
        r#"
        INSERT INTO discos (titulo, lanzamiento, generos, artistas_ids)
        VALUES ($1, $2, $3, $4)
        RETURNING id_disco
        "#,
    )
    .bind(&record.title)
    .bind(record.release_year)
    .bind(&record.genres)
    .bind(&record.artist_ids)
    .fetch_one(conn)
    .await?;
    Ok(id)
}

pub(crate) async fn insert_sale(conn: &mut PgConnection, sale: &SaleInfo) -> Result<i32, DbError> {
    let id = sqlx::query_scalar::<_, i32>(
        r#"
        INSERT INTO ventas (detalle)
        VALUES (ROW($1::varchar, $2::date, $3::int4[])::sale_info)
        RETURNING id_venta
        "#,
    )
    .bind(&sale.customer_name)
    .bind(sale.sale_date)
    .bind(&sale.record_ids)
    .fetch_one(conn)
    .await?;
    Ok(id)
}
