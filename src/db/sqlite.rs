use async_trait::async_trait;
use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;
use std::sync::Arc;

use crate::db::schema_sqlite::{employee, person};

use super::{
    DatabaseError,
    models::{Employee, EmployeeRecord, Person},
};

// SQLite uses i32 for INTEGER (primary keys), but we want to keep i64 in our API
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = person)]
struct DbPerson {
    id: i32,
    name: String,
}

impl From<DbPerson> for Person {
    fn from(value: DbPerson) -> Self {
        Self {
            id: value.id as i64,
            name: value.name,
        }
    }
}

#[derive(Insertable)]
#[diesel(table_name = person)]
struct NewPerson<'a> {
    name: Option<&'a str>,
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = employee)]
struct DbEmployee {
    id: i32,
    person_id: i32,
    salary: i64,
}

impl From<DbEmployee> for Employee {
    fn from(value: DbEmployee) -> Self {
        Self {
            id: value.id as i64,
            person_id: value.person_id as i64,
            salary: value.salary,
        }
    }
}

#[derive(Insertable)]
#[diesel(table_name = employee)]
struct NewEmployee {
    person_id: i32,
    salary: Option<i64>,
}

fn establish_connection(path: &str) -> Result<SqliteConnection, DatabaseError> {
    let mut conn = SqliteConnection::establish(path)
        .map_err(|e| DatabaseError::Connection(e.to_string()))?;

    // Foreign keys are off by default in SQLite; the employee cascade needs them.
    diesel::sql_query("PRAGMA foreign_keys = ON")
        .execute(&mut conn)
        .map_err(|e| DatabaseError::Connection(e.to_string()))?;

    Ok(conn)
}

pub struct SqlitePersonStore {
    db_path: Arc<String>,
}

impl SqlitePersonStore {
    pub fn new(db_path: Arc<String>) -> Self {
        Self { db_path }
    }
}

#[async_trait]
impl super::PersonStore for SqlitePersonStore {
    async fn list_persons(&self) -> Result<Vec<Person>, DatabaseError> {
        let db_path = self.db_path.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = establish_connection(&db_path)?;
            let results = person::table
                .order(person::id.asc())
                .select(DbPerson::as_select())
                .load::<DbPerson>(&mut conn)
                .map_err(|e| DatabaseError::Query(e.to_string()))?;

            Ok(results.into_iter().map(Person::from).collect())
        })
        .await
        .map_err(|e| DatabaseError::Query(format!("database task failed: {e}")))?
    }

    async fn create_person(&self, name: Option<&str>) -> Result<Person, DatabaseError> {
        let name = name.map(str::to_string);
        let db_path = self.db_path.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = establish_connection(&db_path)?;
            let new_person = NewPerson {
                name: name.as_deref(),
            };

            diesel::insert_into(person::table)
                .values(&new_person)
                .returning(DbPerson::as_returning())
                .get_result::<DbPerson>(&mut conn)
                .map(Person::from)
                .map_err(|e| DatabaseError::Query(e.to_string()))
        })
        .await
        .map_err(|e| DatabaseError::Query(format!("database task failed: {e}")))?
    }
}

pub struct SqliteEmployeeStore {
    db_path: Arc<String>,
}

impl SqliteEmployeeStore {
    pub fn new(db_path: Arc<String>) -> Self {
        Self { db_path }
    }
}

#[async_trait]
impl super::EmployeeStore for SqliteEmployeeStore {
    async fn list_employees(&self) -> Result<Vec<EmployeeRecord>, DatabaseError> {
        let db_path = self.db_path.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = establish_connection(&db_path)?;
            let results = employee::table
                .inner_join(person::table)
                .order(employee::id.asc())
                .select((employee::id, person::name, employee::salary))
                .load::<(i32, String, i64)>(&mut conn)
                .map_err(|e| DatabaseError::Query(e.to_string()))?;

            Ok(results
                .into_iter()
                .map(|(id, name, salary)| EmployeeRecord {
                    id: id as i64,
                    name,
                    salary,
                })
                .collect())
        })
        .await
        .map_err(|e| DatabaseError::Query(format!("database task failed: {e}")))?
    }

    async fn create_employee(
        &self,
        person_id: i64,
        salary: Option<i64>,
    ) -> Result<Employee, DatabaseError> {
        let person_id = person_id as i32;
        let db_path = self.db_path.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = establish_connection(&db_path)?;
            let new_employee = NewEmployee { person_id, salary };

            diesel::insert_into(employee::table)
                .values(&new_employee)
                .returning(DbEmployee::as_returning())
                .get_result::<DbEmployee>(&mut conn)
                .map(Employee::from)
                .map_err(|e| DatabaseError::Query(e.to_string()))
        })
        .await
        .map_err(|e| DatabaseError::Query(format!("database task failed: {e}")))?
    }
}
