use std::sync::Arc;

use tracing::debug;

use crate::db::{DatabaseError, DatabaseManager, Employee, EmployeeRecord, Person};

/// Core operations over the person/employee registry.
///
/// Each method maps to one store call, except `create_employee`, which
/// sequences two dependent inserts.
pub struct Registry {
    db: Arc<DatabaseManager>,
}

impl Registry {
    pub fn new(db: Arc<DatabaseManager>) -> Self {
        Self { db }
    }

    pub async fn list_persons(&self) -> Result<Vec<Person>, DatabaseError> {
        self.db.person_store().list_persons().await
    }

    pub async fn create_person(&self, name: Option<&str>) -> Result<Person, DatabaseError> {
        self.db.person_store().create_person(name).await
    }

    pub async fn list_employees(&self) -> Result<Vec<EmployeeRecord>, DatabaseError> {
        self.db.employee_store().list_employees().await
    }

    /// Creates an employee together with its owning person.
    ///
    /// The person is inserted first; if that fails the employee insert never
    /// runs. No transaction wraps the pair, so a failing employee insert
    /// (e.g. missing salary) leaves the person row behind as an orphan.
    pub async fn create_employee(
        &self,
        name: Option<&str>,
        salary: Option<i64>,
    ) -> Result<Employee, DatabaseError> {
        let person = self.db.person_store().create_person(name).await?;
        debug!(person_id = person.id, "person inserted, adding employee");

        self.db
            .employee_store()
            .create_employee(person.id, salary)
            .await
    }
}
