mod common;

use chrono::{Local, NaiveDate};
use common::{
    REJECT_CUSTOMER_CHECK, REJECT_GENRE_CHECK, count_rows, drop_rejecting_checks, execute, lock, open,
    prepare_test_database, test_config,
};
use configuration::DbConfig;
use database::{DbError, DbRepository, FailureKind, close, close_after, connect, install_reference_guard};
use std::time::Duration;
use pretty_assertions::assert_eq;

fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

#[tokio::test]
async fn unreachable_server_is_an_operational_failure() {
    let config = DbConfig {
        host: "127.0.0.1".to_string(),
        port: 1,
        ..DbConfig::default()
    };

    let err = connect(&config).await.unwrap_err();
    assert_eq!(err.kind(), FailureKind::Operational);
}

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn unknown_database_is_an_operational_failure() {
    let config = DbConfig {
        dbname: "no_such_db".to_string(),
        ..test_config()
    };

    let err = connect(&config).await.unwrap_err();
    assert_eq!(err.kind(), FailureKind::Operational);
    assert_eq!(err.sqlstate().as_deref(), Some("3D000"));
}

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn wrong_password_is_an_operational_failure() {
    let config = DbConfig {
        password: "definitely-not-the-password".to_string(),
        ..test_config()
    };

    // Servers configured with `trust` accept any password.
    if let Err(err) = connect(&config).await {
        assert_eq!(err.kind(), FailureKind::Operational);
    }
}

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn close_after_keeps_the_result_when_closing_fails() {
    let _guard = lock().await;
    let mut conn = open().await;
    let pid: i32 = sqlx::query_scalar("SELECT pg_backend_pid()")
        .fetch_one(&mut conn)
        .await
        .unwrap();

    let mut admin = open().await;
    sqlx::query("SELECT pg_terminate_backend($1)")
        .bind(pid)
        .execute(&mut admin)
        .await
        .unwrap();
    close(admin).await.unwrap();
    tokio::time::sleep(Duration::from_millis(200)).await;

    assert_eq!(close_after(conn, Ok::<_, DbError>(5)).await.unwrap(), 5);
}

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn connection_opens_and_closes() {
    let _guard = lock().await;
    let conn = open().await;
    close(conn).await.unwrap();
}

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn create_sale_commits_exactly_one_row() {
    let _guard = lock().await;
    let mut conn = prepare_test_database().await;
    let today = Local::now().date_naive();

    let sale_id = DbRepository::new(&mut conn)
        .create_sale("VíctorTest", today, &[1])
        .await
        .unwrap();
    assert_eq!(sale_id, 1);
    close(conn).await.unwrap();

    // A fresh connection only sees committed rows.
    let mut conn = open().await;
    let mut repo = DbRepository::new(&mut conn);
    assert_eq!(repo.count_sales_for("VíctorTest").await.unwrap(), 1);
    assert_eq!(repo.purchased_records_for("VíctorTest").await.unwrap(), Some(vec![1]));
}

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn sale_without_records_is_rejected_before_touching_the_database() {
    let _guard = lock().await;
    let mut conn = prepare_test_database().await;
    let mut repo = DbRepository::new(&mut conn);

    let err = repo
        .create_sale("Cliente Fallido", date(2025, 1, 1), &[])
        .await
        .unwrap_err();

    assert_eq!(err.kind(), FailureKind::Validation);
    assert_eq!(repo.count_sales_for("Cliente Fallido").await.unwrap(), 0);
    assert_eq!(count_rows(&mut conn, "ventas").await, 0);
}

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn refused_sale_is_rolled_back_and_the_connection_stays_usable() {
    let _guard = lock().await;
    let mut conn = prepare_test_database().await;
    execute(&mut conn, REJECT_CUSTOMER_CHECK).await;
    let mut repo = DbRepository::new(&mut conn);

    let err = repo
        .create_sale("Bad", date(2025, 1, 1), &[1])
        .await
        .unwrap_err();

    assert_eq!(err.kind(), FailureKind::Integrity);
    assert_eq!(err.sqlstate().as_deref(), Some("23514"));
    assert_eq!(repo.count_sales_for("Bad").await.unwrap(), 0);

    repo.create_sale("Good", date(2025, 1, 2), &[1]).await.unwrap();
    assert_eq!(count_rows(&mut conn, "ventas").await, 1);
    drop_rejecting_checks(&mut conn).await;
}

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn sale_may_reference_records_that_do_not_exist() {
    let _guard = lock().await;
    let mut conn = prepare_test_database().await;
    let mut repo = DbRepository::new(&mut conn);

    repo.create_sale("Juan Pérez", date(2025, 1, 15), &[1, 2, 3])
        .await
        .unwrap();

    let orphans = repo.find_orphaned_references().await.unwrap();
    assert_eq!(orphans.sales_missing_records.len(), 2);
    assert_eq!(orphans.sales_missing_records[0].missing_id, 2);
    assert_eq!(orphans.sales_missing_records[1].missing_id, 3);
    assert!(orphans.records_missing_artists.is_empty());
}

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn update_genres_replaces_the_set() {
    let _guard = lock().await;
    let mut conn = prepare_test_database().await;
    let mut repo = DbRepository::new(&mut conn);
    let genres = vec!["Rock".to_string(), "Indie".to_string()];

    repo.update_genres(1, &genres).await.unwrap();

    assert_eq!(repo.record_genres(1).await.unwrap(), Some(genres));
}

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn update_genres_with_the_current_value_still_succeeds() {
    let _guard = lock().await;
    let mut conn = prepare_test_database().await;
    let mut repo = DbRepository::new(&mut conn);
    let current = repo.record_genres(1).await.unwrap().unwrap();

    repo.update_genres(1, &current).await.unwrap();

    assert_eq!(repo.record_genres(1).await.unwrap(), Some(current));
}

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn update_genres_of_missing_record_is_not_found_and_changes_nothing() {
    let _guard = lock().await;
    let mut conn = prepare_test_database().await;
    let mut repo = DbRepository::new(&mut conn);
    let before = repo.record_genres(1).await.unwrap();

    let err = repo
        .update_genres(999, &["Jazz".to_string()])
        .await
        .unwrap_err();

    assert!(matches!(err, DbError::NotFound { id: 999, .. }));
    assert_eq!(repo.record_genres(1).await.unwrap(), before);
    assert_eq!(repo.record_genres(999).await.unwrap(), None);
}

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn refused_genre_update_is_rolled_back() {
    let _guard = lock().await;
    let mut conn = prepare_test_database().await;
    execute(&mut conn, REJECT_GENRE_CHECK).await;
    let mut repo = DbRepository::new(&mut conn);
    let before = repo.record_genres(1).await.unwrap();

    let err = repo
        .update_genres(1, &["Rock".to_string(), "Bad".to_string()])
        .await
        .unwrap_err();

    assert_eq!(err.kind(), FailureKind::Integrity);
    assert_eq!(repo.record_genres(1).await.unwrap(), before);

    let genres = vec!["Jazz".to_string()];
    repo.update_genres(1, &genres).await.unwrap();
    assert_eq!(repo.record_genres(1).await.unwrap(), Some(genres));
    drop_rejecting_checks(&mut conn).await;
}

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn delete_artist_removes_the_row() {
    let _guard = lock().await;
    let mut conn = prepare_test_database().await;
    let mut repo = DbRepository::new(&mut conn);

    repo.delete_artist(2).await.unwrap();

    assert!(!repo.artist_exists(2).await.unwrap());
    assert!(repo.artist_exists(1).await.unwrap());
}

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn delete_missing_artist_is_not_found() {
    let _guard = lock().await;
    let mut conn = prepare_test_database().await;

    let err = DbRepository::new(&mut conn).delete_artist(42).await.unwrap_err();

    assert_eq!(err.kind(), FailureKind::NotFound);
    assert_eq!(count_rows(&mut conn, "artistas").await, 2);
}

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn referenced_artist_can_be_deleted_without_the_guard() {
    let _guard = lock().await;
    let mut conn = prepare_test_database().await;
    let mut repo = DbRepository::new(&mut conn);

    repo.delete_artist(1).await.unwrap();

    let orphans = repo.find_orphaned_references().await.unwrap();
    assert_eq!(orphans.records_missing_artists.len(), 1);
    assert_eq!(orphans.records_missing_artists[0].owner_id, 1);
    assert_eq!(orphans.records_missing_artists[0].missing_id, 1);
}

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn guard_turns_referenced_delete_into_integrity_failure() {
    let _guard = lock().await;
    let mut conn = prepare_test_database().await;
    install_reference_guard(&mut conn).await.unwrap();
    let mut repo = DbRepository::new(&mut conn);

    let err = repo.delete_artist(1).await.unwrap_err();

    assert_eq!(err.kind(), FailureKind::Integrity);
    assert_eq!(err.sqlstate().as_deref(), Some("23503"));
    assert!(repo.artist_exists(1).await.unwrap());

    // Unreferenced artists are still deletable with the guard in place.
    repo.delete_artist(2).await.unwrap();
    assert!(!repo.artist_exists(2).await.unwrap());
}
