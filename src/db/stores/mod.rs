use async_trait::async_trait;

use super::DatabaseError;
use super::models::{Employee, EmployeeRecord, Person};

/// Single-statement operations over the `person` table.
///
/// `create_person` takes an optional name so that a request without one
/// reaches the database as NULL and fails on the NOT NULL constraint rather
/// than being rejected up front.
#[async_trait]
pub trait PersonStore: Send + Sync {
    async fn list_persons(&self) -> Result<Vec<Person>, DatabaseError>;
    async fn create_person(&self, name: Option<&str>) -> Result<Person, DatabaseError>;
}

#[async_trait]
pub trait EmployeeStore: Send + Sync {
    /// Lists every employee joined to its person, as `id, name, salary`.
    async fn list_employees(&self) -> Result<Vec<EmployeeRecord>, DatabaseError>;
    async fn create_employee(
        &self,
        person_id: i64,
        salary: Option<i64>,
    ) -> Result<Employee, DatabaseError>;
}
