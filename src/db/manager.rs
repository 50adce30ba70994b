use crate::config::{DatabaseConfig as ConfigDatabaseConfig, DbType as ConfigDbType};
use crate::db::{DatabaseError, EmployeeStore, PersonStore};
use std::sync::Arc;

#[cfg(any(feature = "postgres", feature = "sqlite"))]
use diesel::RunQueryDsl;

#[cfg(feature = "postgres")]
use crate::db::postgres::{PostgresEmployeeStore, PostgresPersonStore};
#[cfg(feature = "postgres")]
use diesel::pg::PgConnection;
#[cfg(feature = "postgres")]
use diesel::r2d2::{self, ConnectionManager};

#[cfg(feature = "postgres")]
pub type Pool = r2d2::Pool<ConnectionManager<PgConnection>>;

#[cfg(feature = "sqlite")]
use crate::db::sqlite::{SqliteEmployeeStore, SqlitePersonStore};
#[cfg(feature = "sqlite")]
use diesel::Connection;
#[cfg(feature = "sqlite")]
use diesel::sqlite::SqliteConnection;

/// Process-wide database handle: created once at startup, never torn down.
#[derive(Clone)]
pub struct DatabaseManager {
    #[cfg(feature = "postgres")]
    postgres_pool: Option<Pool>,
    #[cfg(feature = "sqlite")]
    sqlite_path: Option<String>,
    person_store: Arc<dyn PersonStore>,
    employee_store: Arc<dyn EmployeeStore>,
    db_type: DbType,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DbType {
    Postgres,
    Sqlite,
}

impl From<ConfigDbType> for DbType {
    fn from(value: ConfigDbType) -> Self {
        match value {
            ConfigDbType::Postgres => DbType::Postgres,
            ConfigDbType::Sqlite => DbType::Sqlite,
        }
    }
}

impl DatabaseManager {
    pub async fn new(config: &ConfigDatabaseConfig) -> Result<Self, DatabaseError> {
        let db_type = DbType::from(config.db_type());

        match db_type {
            #[cfg(feature = "postgres")]
            DbType::Postgres => {
                let connection_string = config.connection_string();
                let max_connections = config.max_connections();
                let min_connections = config.min_connections();

                let manager = ConnectionManager::<PgConnection>::new(connection_string);

                let builder = r2d2::Pool::builder()
                    .max_size(max_connections.unwrap_or(10))
                    .min_idle(Some(min_connections.unwrap_or(1)));

                let pool = builder
                    .build(manager)
                    .map_err(|e| DatabaseError::Connection(e.to_string()))?;

                let person_store = Arc::new(PostgresPersonStore::new(pool.clone()));
                let employee_store = Arc::new(PostgresEmployeeStore::new(pool.clone()));

                Ok(Self {
                    postgres_pool: Some(pool),
                    #[cfg(feature = "sqlite")]
                    sqlite_path: None,
                    person_store,
                    employee_store,
                    db_type,
                })
            }
            #[cfg(feature = "sqlite")]
            DbType::Sqlite => {
                let path = config.sqlite_path().ok_or_else(|| {
                    DatabaseError::Connection("missing sqlite database path".to_string())
                })?;
                let path_arc = Arc::new(path.clone());

                let person_store = Arc::new(SqlitePersonStore::new(path_arc.clone()));
                let employee_store = Arc::new(SqliteEmployeeStore::new(path_arc));

                Ok(Self {
                    #[cfg(feature = "postgres")]
                    postgres_pool: None,
                    sqlite_path: Some(path),
                    person_store,
                    employee_store,
                    db_type,
                })
            }
            #[cfg(not(feature = "postgres"))]
            DbType::Postgres => Err(DatabaseError::Connection(
                "PostgreSQL feature not enabled".to_string(),
            )),
            #[cfg(not(feature = "sqlite"))]
            DbType::Sqlite => Err(DatabaseError::Connection(
                "SQLite feature not enabled".to_string(),
            )),
        }
    }

    pub async fn migrate(&self) -> Result<(), DatabaseError> {
        match self.db_type {
            #[cfg(feature = "postgres")]
            DbType::Postgres => {
                let pool = self.postgres_pool.as_ref().ok_or_else(|| {
                    DatabaseError::Migration("postgres pool not initialized".to_string())
                })?;
                Self::migrate_postgres(pool).await
            }
            #[cfg(feature = "sqlite")]
            DbType::Sqlite => {
                let path = self.sqlite_path.as_ref().ok_or_else(|| {
                    DatabaseError::Migration("sqlite path not initialized".to_string())
                })?;
                Self::migrate_sqlite(path).await
            }
            #[cfg(not(feature = "postgres"))]
            DbType::Postgres => Err(DatabaseError::Migration(
                "PostgreSQL feature not enabled".to_string(),
            )),
            #[cfg(not(feature = "sqlite"))]
            DbType::Sqlite => Err(DatabaseError::Migration(
                "SQLite feature not enabled".to_string(),
            )),
        }
    }

    #[cfg(feature = "postgres")]
    async fn migrate_postgres(pool: &Pool) -> Result<(), DatabaseError> {
        let pool = pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = pool
                .get()
                .map_err(|e| DatabaseError::Connection(e.to_string()))?;

            let statements = [
                r#"
                CREATE TABLE IF NOT EXISTS person (
                    id BIGSERIAL PRIMARY KEY,
                    name TEXT NOT NULL UNIQUE
                )
                "#,
                r#"
                CREATE TABLE IF NOT EXISTS employee (
                    id BIGSERIAL PRIMARY KEY,
                    person_id BIGINT NOT NULL REFERENCES person(id) ON DELETE CASCADE,
                    salary BIGINT NOT NULL
                )
                "#,
                "CREATE INDEX IF NOT EXISTS idx_employee_person ON employee(person_id)",
            ];

            for statement in statements {
                diesel::sql_query(statement)
                    .execute(&mut conn)
                    .map_err(|e| DatabaseError::Migration(e.to_string()))?;
            }

            Ok(())
        })
        .await
        .map_err(|e| DatabaseError::Migration(format!("migration task failed: {e}")))?
    }

    #[cfg(feature = "sqlite")]
    async fn migrate_sqlite(path: &str) -> Result<(), DatabaseError> {
        let path = path.to_string();
        tokio::task::spawn_blocking(move || {
            let mut conn = SqliteConnection::establish(&path)
                .map_err(|e| DatabaseError::Connection(e.to_string()))?;

            let statements = [
                r#"
                CREATE TABLE IF NOT EXISTS person (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    name TEXT NOT NULL UNIQUE
                )
                "#,
                r#"
                CREATE TABLE IF NOT EXISTS employee (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    person_id INTEGER NOT NULL REFERENCES person(id) ON DELETE CASCADE,
                    salary INTEGER NOT NULL
                )
                "#,
                "CREATE INDEX IF NOT EXISTS idx_employee_person ON employee(person_id)",
            ];

            for statement in statements {
                diesel::sql_query(statement)
                    .execute(&mut conn)
                    .map_err(|e| DatabaseError::Migration(e.to_string()))?;
            }

            Ok(())
        })
        .await
        .map_err(|e| DatabaseError::Migration(format!("migration task failed: {e}")))?
    }

    pub fn person_store(&self) -> Arc<dyn PersonStore> {
        self.person_store.clone()
    }

    pub fn employee_store(&self) -> Arc<dyn EmployeeStore> {
        self.employee_store.clone()
    }

    pub fn db_type(&self) -> DbType {
        self.db_type
    }
}

#[cfg(all(test, feature = "sqlite"))]
mod tests {
    use tempfile::NamedTempFile;

    use super::DatabaseManager;
    use crate::config::DatabaseConfig;

    fn sqlite_config(path: &str) -> DatabaseConfig {
        DatabaseConfig {
            url: None,
            conn_string: None,
            filename: Some(path.to_string()),
            max_connections: Some(1),
            min_connections: Some(1),
        }
    }

    #[tokio::test]
    async fn sqlite_person_roundtrip() {
        let file = NamedTempFile::new().expect("temp sqlite file");
        let db_path = file.path().to_string_lossy().to_string();

        let manager = DatabaseManager::new(&sqlite_config(&db_path))
            .await
            .expect("db manager");
        manager.migrate().await.expect("migrate");

        let ada = manager
            .person_store()
            .create_person(Some("Ada"))
            .await
            .expect("insert person");
        assert!(ada.id > 0);
        assert_eq!(ada.name, "Ada");

        let persons = manager
            .person_store()
            .list_persons()
            .await
            .expect("list persons");
        assert_eq!(persons.len(), 1);
        assert_eq!(persons[0].id, ada.id);
        assert_eq!(persons[0].name, "Ada");

        // Migrations are idempotent and data survives a reopen.
        let manager_reopened = DatabaseManager::new(&sqlite_config(&db_path))
            .await
            .expect("db manager reopened");
        manager_reopened.migrate().await.expect("migrate reopened");

        let persisted = manager_reopened
            .person_store()
            .list_persons()
            .await
            .expect("list after reopen");
        assert_eq!(persisted.len(), 1);
        assert_eq!(persisted[0].name, "Ada");
    }

    #[tokio::test]
    async fn duplicate_person_name_is_rejected() {
        let file = NamedTempFile::new().expect("temp sqlite file");
        let db_path = file.path().to_string_lossy().to_string();

        let manager = DatabaseManager::new(&sqlite_config(&db_path))
            .await
            .expect("db manager");
        manager.migrate().await.expect("migrate");

        manager
            .person_store()
            .create_person(Some("Grace"))
            .await
            .expect("first insert");

        let err = manager
            .person_store()
            .create_person(Some("Grace"))
            .await
            .expect_err("duplicate insert must fail");
        assert!(err.to_string().contains("UNIQUE constraint failed"));

        let persons = manager
            .person_store()
            .list_persons()
            .await
            .expect("list persons");
        assert_eq!(persons.len(), 1);
    }

    #[tokio::test]
    async fn employee_joins_to_person() {
        let file = NamedTempFile::new().expect("temp sqlite file");
        let db_path = file.path().to_string_lossy().to_string();

        let manager = DatabaseManager::new(&sqlite_config(&db_path))
            .await
            .expect("db manager");
        manager.migrate().await.expect("migrate");

        let person = manager
            .person_store()
            .create_person(Some("Edsger"))
            .await
            .expect("insert person");

        let employee = manager
            .employee_store()
            .create_employee(person.id, Some(450_000))
            .await
            .expect("insert employee");
        assert_eq!(employee.person_id, person.id);
        assert_eq!(employee.salary, 450_000);

        let records = manager
            .employee_store()
            .list_employees()
            .await
            .expect("list employees");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id, employee.id);
        assert_eq!(records[0].name, "Edsger");
        assert_eq!(records[0].salary, 450_000);
    }

    #[tokio::test]
    async fn missing_salary_hits_not_null_constraint() {
        let file = NamedTempFile::new().expect("temp sqlite file");
        let db_path = file.path().to_string_lossy().to_string();

        let manager = DatabaseManager::new(&sqlite_config(&db_path))
            .await
            .expect("db manager");
        manager.migrate().await.expect("migrate");

        let person = manager
            .person_store()
            .create_person(Some("Barbara"))
            .await
            .expect("insert person");

        let err = manager
            .employee_store()
            .create_employee(person.id, None)
            .await
            .expect_err("missing salary must fail");
        assert!(err.to_string().contains("NOT NULL constraint failed"));
    }

    #[tokio::test]
    async fn missing_name_hits_not_null_constraint() {
        let file = NamedTempFile::new().expect("temp sqlite file");
        let db_path = file.path().to_string_lossy().to_string();

        let manager = DatabaseManager::new(&sqlite_config(&db_path))
            .await
            .expect("db manager");
        manager.migrate().await.expect("migrate");

        let err = manager
            .person_store()
            .create_person(None)
            .await
            .expect_err("missing name must fail");
        assert!(err.to_string().contains("NOT NULL constraint failed"));
    }
}
