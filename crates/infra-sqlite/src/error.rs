// sqlx -> AppError mapping
// (orphan rule: From<sqlx::Error> for AppError cannot live here)

use navtrack_core::error::AppError;

pub(crate) fn map_sqlx_error(err: sqlx::Error) -> AppError {
    match &err {
        sqlx::Error::Database(db_err) => {
            let message = db_err.message();
            // SQLite result codes: https://www.sqlite.org/rescode.html
            match db_err.code().as_deref() {
                Some("2067") | Some("1555") => {
                    AppError::Database(format!("Unique constraint violation: {}", message))
                }
                Some("5") | Some("517") => {
                    AppError::Database(format!("Database locked (SQLITE_BUSY): {}", message))
                }
                Some("13") => AppError::Database(format!("Database full: {}", message)),
                Some(code) => AppError::Database(format!("Database error [{}]: {}", code, message)),
                None => AppError::Database(format!("Database error: {}", message)),
            }
        }
        sqlx::Error::RowNotFound => AppError::Database("Row not found".to_string()),
        sqlx::Error::ColumnNotFound(col) => {
            AppError::Database(format!("Column not found: {}", col))
        }
        sqlx::Error::PoolTimedOut => AppError::Database("Connection pool timed out".to_string()),
        _ => AppError::Database(err.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_database_errors() {
        assert!(matches!(
            map_sqlx_error(sqlx::Error::RowNotFound),
            AppError::Database(msg) if msg == "Row not found"
        ));
        assert!(matches!(
            map_sqlx_error(sqlx::Error::PoolTimedOut),
            AppError::Database(msg) if msg.contains("timed out")
        ));
    }
}
