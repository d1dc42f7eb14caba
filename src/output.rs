//! Human-readable status lines (in Spanish) and report tables for the CLI.

use comfy_table::Table;
use core_types::{OrphanReport, ReportSet};
use database::{DbError, FailureKind};

/// The message printed for a failed operation, labelled by failure kind.
pub fn failure_line(err: &DbError) -> String {
    if let DbError::NotFound { entity, id } = err {
        return format!("Error de búsqueda: no existe el {} con id {id}", entity.label_es());
    }
    let label = match err.kind() {
        FailureKind::Validation => "Error de validación",
        FailureKind::NotFound => "Error de búsqueda",
        FailureKind::Integrity => "Error de integridad",
        FailureKind::Operational => "Error de la base de datos",
        FailureKind::Database => "Error general de la base de datos",
    };
    format!("{label}: {err}")
}

/// Like [`failure_line`], but an integrity failure on delete names the likely cause.
pub fn delete_failure_line(err: &DbError) -> String {
    match err.kind() {
        FailureKind::Integrity => format!("Error de integridad (posible dependencia): {err}"),
        _ => failure_line(err),
    }
}

pub fn print_reports(reports: &ReportSet, genre: &str, customer: &str, record_id: i32) {
    let mut titles = Table::new();
    titles.set_header(vec![format!("Discos de {genre}")]);
    for title in &reports.rock_titles {
        titles.add_row(vec![title.clone()]);
    }
    println!("{titles}");

    match &reports.purchased_record_ids {
        Some(ids) => {
            let ids: Vec<String> = ids.iter().map(|id| id.to_string()).collect();
            println!("Discos comprados por {customer}: {}", ids.join(", "));
        }
        None => println!("No hay ventas registradas para {customer}."),
    }

    let mut artists = Table::new();
    artists.set_header(vec!["Nombre", "Nacionalidad"]);
    for artist in &reports.record_artists {
        artists.add_row(vec![artist.first_name.clone(), artist.nationality.clone()]);
    }
    println!("Artistas del disco {record_id}:");
    println!("{artists}");
}

pub fn print_orphans(report: &OrphanReport) {
    if report.is_clean() {
        println!("Sin referencias huérfanas.");
        return;
    }

    let mut table = Table::new();
    table.set_header(vec!["Tabla", "Fila", "Id inexistente"]);
    for orphan in &report.records_missing_artists {
        table.add_row(vec!["discos".to_string(), orphan.owner_id.to_string(), orphan.missing_id.to_string()]);
    }
    for orphan in &report.sales_missing_records {
        table.add_row(vec!["ventas".to_string(), orphan.owner_id.to_string(), orphan.missing_id.to_string()]);
    }
    println!("{table}");
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_types::{CoreError, Entity};

    #[test]
    fn failure_lines_are_labelled_by_kind() {
        let err = DbError::NotFound { entity: Entity::Artist, id: 7 };
        assert_eq!(failure_line(&err), "Error de búsqueda: no existe el artista con id 7");

        let err: DbError = CoreError::InvalidInput("record_ids".into(), "empty".into()).into();
        assert!(failure_line(&err).starts_with("Error de validación: "));
    }

    #[test]
    fn delete_lines_only_change_for_integrity() {
        let err = DbError::NotFound { entity: Entity::Artist, id: 7 };
        assert_eq!(delete_failure_line(&err), failure_line(&err));
    }
}
