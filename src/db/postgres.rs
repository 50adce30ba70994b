use async_trait::async_trait;
use diesel::pg::PgConnection;
use diesel::prelude::*;

use crate::db::manager::Pool;
use crate::db::schema::{employee, person};

use super::{
    DatabaseError,
    models::{Employee, EmployeeRecord, Person},
};

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = person)]
struct DbPerson {
    id: i64,
    name: String,
}

impl From<DbPerson> for Person {
    fn from(value: DbPerson) -> Self {
        Self {
            id: value.id,
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
    id: i64,
    person_id: i64,
    salary: i64,
}

impl From<DbEmployee> for Employee {
    fn from(value: DbEmployee) -> Self {
        Self {
            id: value.id,
            person_id: value.person_id,
            salary: value.salary,
        }
    }
}

#[derive(Insertable)]
#[diesel(table_name = employee)]
struct NewEmployee {
    person_id: i64,
    salary: Option<i64>,
}

async fn with_connection<T, F>(pool: Pool, operation: F) -> Result<T, DatabaseError>
where
    T: Send + 'static,
    F: FnOnce(&mut PgConnection) -> Result<T, DatabaseError> + Send + 'static,
{
    tokio::task::spawn_blocking(move || {
        let mut conn = pool
            .get()
            .map_err(|e| DatabaseError::Connection(e.to_string()))?;
        operation(&mut conn)
    })
    .await
    .map_err(|e| DatabaseError::Query(format!("database task failed: {e}")))?
}

pub struct PostgresPersonStore {
    pool: Pool,
}

impl PostgresPersonStore {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl super::PersonStore for PostgresPersonStore {
    async fn list_persons(&self) -> Result<Vec<Person>, DatabaseError> {
        with_connection(self.pool.clone(), |conn| {
            let results = person::table
                .order(person::id.asc())
                .select(DbPerson::as_select())
                .load::<DbPerson>(conn)
                .map_err(|e| DatabaseError::Query(e.to_string()))?;

            Ok(results.into_iter().map(Person::from).collect())
        })
        .await
    }

    async fn create_person(&self, name: Option<&str>) -> Result<Person, DatabaseError> {
        let name = name.map(str::to_string);
        with_connection(self.pool.clone(), move |conn| {
            let new_person = NewPerson {
                name: name.as_deref(),
            };

            diesel::insert_into(person::table)
                .values(&new_person)
                .returning(DbPerson::as_returning())
                .get_result::<DbPerson>(conn)
                .map(Person::from)
                .map_err(|e| DatabaseError::Query(e.to_string()))
        })
        .await
    }
}

pub struct PostgresEmployeeStore {
    pool: Pool,
}

impl PostgresEmployeeStore {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl super::EmployeeStore for PostgresEmployeeStore {
    async fn list_employees(&self) -> Result<Vec<EmployeeRecord>, DatabaseError> {
        with_connection(self.pool.clone(), |conn| {
            let results = employee::table
                .inner_join(person::table)
                .order(employee::id.asc())
                .select((employee::id, person::name, employee::salary))
                .load::<(i64, String, i64)>(conn)
                .map_err(|e| DatabaseError::Query(e.to_string()))?;

            Ok(results
                .into_iter()
                .map(|(id, name, salary)| EmployeeRecord { id, name, salary })
                .collect())
        })
        .await
    }

    async fn create_employee(
        &self,
        person_id: i64,
        salary: Option<i64>,
    ) -> Result<Employee, DatabaseError> {
        with_connection(self.pool.clone(), move |conn| {
            let new_employee = NewEmployee { person_id, salary };

            diesel::insert_into(employee::table)
                .values(&new_employee)
                .returning(DbEmployee::as_returning())
                .get_result::<DbEmployee>(conn)
                .map(Employee::from)
                .map_err(|e| DatabaseError::Query(e.to_string()))
        })
        .await
    }
}
