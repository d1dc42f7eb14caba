use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use configuration::{DbConfig, DbOverrides, init_tracing, load_config};
use database::{
    DbRepository, PgConnection, REPORT_CUSTOMER, REPORT_GENRE, REPORT_RECORD_ID, close, close_after,
    connect, ensure_schema_with_config, install_reference_guard, load_sample_data_with_config,
    remove_reference_guard,
};

mod output;

/// The main entry point for the record shop database tool.
#[tokio::main]
async fn main() -> Result<()> {
    // A .env file is optional; it only provides DISCOTECA__* overrides.
    dotenvy::dotenv().ok();

    // Parse command-line arguments
    let cli = Cli::parse();

    let config = load_config().context("Failed to load configuration")?;
    let _log_guard = init_tracing(&config.logging).context("Failed to initialise logging")?;

    let mut db_config = config.database;
    db_config.apply(&cli.db);

    // Execute the appropriate command
    match cli.command {
        Commands::CreateSchema => handle_create_schema(&db_config).await,
        Commands::Seed => handle_seed(&db_config).await,
        Commands::Run(args) => handle_run(args, &db_config).await,
        Commands::InstallGuard => handle_guard(&db_config, true).await,
        Commands::RemoveGuard => handle_guard(&db_config, false).await,
        Commands::CheckIntegrity => handle_check_integrity(&db_config).await,
    }
}

// ==============================================================================
// CLI Structure
// ==============================================================================

/// Schema setup, sample data and CRUD operations for the record shop database.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(flatten)]
    db: DbOverrides,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the composite types and tables if they are missing.
    CreateSchema,
    /// Insert the sample artists, records and sale.
    Seed,
    /// Run the sale/update/delete sequence followed by the fixed reports.
    Run(RunArgs),
    /// Make deleting a referenced artist fail with an integrity error.
    InstallGuard,
    /// Remove the artist reference guard.
    RemoveGuard,
    /// List ids in the reference arrays that point at missing rows.
    CheckIntegrity,
}

#[derive(Parser)]
struct RunArgs {
    /// Customer name for the new sale.
    #[arg(long, default_value = "Juan Pérez")]
    customer: String,

    /// Date of the sale (format: YYYY-MM-DD).
    #[arg(long, default_value = "2025-01-15")]
    date: NaiveDate,

    /// Comma-separated ids of the records sold.
    #[arg(long, value_delimiter = ',', default_values_t = vec![1, 2, 3])]
    records: Vec<i32>,

    /// Record whose genres are replaced.
    #[arg(long, default_value_t = 1)]
    record_id: i32,

    /// Comma-separated replacement genres.
    #[arg(long, value_delimiter = ',', default_values_t = vec!["Rock".to_string(), "Indie".to_string()])]
    genres: Vec<String>,

    /// Artist to delete.
    #[arg(long, default_value_t = 1)]
    artist_id: i32,
}

// ==============================================================================
// Command Logic
// ==============================================================================

async fn open_connection(config: &DbConfig) -> Result<PgConnection> {
    match connect(config).await {
        Ok(conn) => Ok(conn),
        Err(e) => {
            println!("No se pudo conectar a la base de datos.");
            Err(e).context("Connection failed")
        }
    }
}

async fn handle_create_schema(config: &DbConfig) -> Result<()> {
    match ensure_schema_with_config(config).await {
        Ok(()) => {
            println!("Tablas y tipos creados con éxito.");
            Ok(())
        }
        Err(e) => {
            println!("{}", output::failure_line(&e));
            Err(e).context("Schema creation failed")
        }
    }
}

async fn handle_seed(config: &DbConfig) -> Result<()> {
    println!("Insertando datos de ejemplo...");
    match load_sample_data_with_config(config).await {
        Ok(summary) => {
            println!(
                "¡Datos insertados correctamente! ({} artistas, {} discos, venta {})",
                summary.artist_ids.len(),
                summary.record_ids.len(),
                summary.sale_id
            );
            Ok(())
        }
        Err(e) => {
            println!("Error al poblar datos: {e}");
            Err(e).context("Loading sample data failed")
        }
    }
}

/// Each step commits or rolls back on its own; a failed step is reported
/// and the sequence carries on.
async fn handle_run(args: RunArgs, config: &DbConfig) -> Result<()> {
    let mut conn = open_connection(config).await?;
    let mut repo = DbRepository::new(&mut conn);

    // Write operations (CREATE / UPDATE / DELETE)
    match repo.create_sale(&args.customer, args.date, &args.records).await {
        Ok(sale_id) => println!("Venta de {} registrada con éxito (id {sale_id}).", args.customer),
        Err(e) => println!("{}", output::failure_line(&e)),
    }

    match repo.update_genres(args.record_id, &args.genres).await {
        Ok(()) => println!("Géneros del disco actualizados."),
        Err(e) => println!("{}", output::failure_line(&e)),
    }

    match repo.delete_artist(args.artist_id).await {
        Ok(()) => println!("Artista {} eliminado.", args.artist_id),
        Err(e) => println!("{}", output::delete_failure_line(&e)),
    }

    // Fixed reports
    match repo.run_reports().await {
        Ok(reports) => output::print_reports(&reports, REPORT_GENRE, REPORT_CUSTOMER, REPORT_RECORD_ID),
        Err(e) => println!("Error en consultas: {e}"),
    }

    // The connection is closed once, at the end.
    close(conn).await?;
    Ok(())
}

async fn handle_guard(config: &DbConfig, install: bool) -> Result<()> {
    let mut conn = open_connection(config).await?;
    let result = if install {
        install_reference_guard(&mut conn).await
    } else {
        remove_reference_guard(&mut conn).await
    };

    match close_after(conn, result).await {
        Ok(()) if install => println!("Protección de referencias de artistas instalada."),
        Ok(()) => println!("Protección de referencias de artistas eliminada."),
        Err(e) => {
            println!("{}", output::failure_line(&e));
            return Err(e).context("Updating the reference guard failed");
        }
    }
    Ok(())
}

async fn handle_check_integrity(config: &DbConfig) -> Result<()> {
    let mut conn = open_connection(config).await?;
    let result = DbRepository::new(&mut conn).find_orphaned_references().await;

    match close_after(conn, result).await {
        Ok(report) => {
            output::print_orphans(&report);
            Ok(())
        }
        Err(e) => {
            println!("{}", output::failure_line(&e));
            Err(e).context("Integrity check failed")
        }
    }
}
