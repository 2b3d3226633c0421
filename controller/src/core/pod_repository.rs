use crate::api::ControllerError;
use crate::core::PodRepository;
use crate::database::{PodDataBase, PodRecords};
use definition::pod::{Pod, SyncStatus};
use rusqlite::{ffi, Connection, ErrorCode};
use std::sync::Arc;

pub struct PodRepositoryImpl {
    database: Arc<PodDataBase>,
}

impl PodRepositoryImpl {
    pub fn new(database: Arc<PodDataBase>) -> PodRepositoryImpl {
        PodRepositoryImpl { database }
    }

    fn get_connection(&self) -> Result<Connection, ControllerError> {
        self.database.open().map_err(ControllerError::Database)
    }
}

/// Sort integrity failures into a duplicated pod name and every other constraint
fn map_write_error(error: rusqlite::Error, pod_name: &str) -> ControllerError {
    if let rusqlite::Error::SqliteFailure(failure, message) = &error {
        if failure.code == ErrorCode::ConstraintViolation {
            let message = message.clone().unwrap_or_else(|| error.to_string());
            if failure.extended_code == ffi::SQLITE_CONSTRAINT_UNIQUE
                && message.contains("pod.name")
            {
                return ControllerError::DuplicateName(pod_name.to_string());
            }
            return ControllerError::ConstraintViolation(message);
        }
    }
    ControllerError::Database(error)
}

impl PodRepository for PodRepositoryImpl {
    fn register_pod(&self, pod: &Pod) -> Result<i64, ControllerError> {
        let mut connection = self.get_connection()?;
        let transaction = connection.transaction()?;

        let id = PodRecords::insert(&transaction, pod).map_err(|e| map_write_error(e, &pod.name))?;
        PodRecords::insert_children(&transaction, id, &pod.ports, &pod.envs)
            .map_err(|e| map_write_error(e, &pod.name))?;

        transaction.commit()?;
        Ok(id)
    }

    fn fetch_pod(&self, id: i64) -> Result<Pod, ControllerError> {
        let connection = self.get_connection()?;
        PodRecords::find_one(&connection, id)?
            .ok_or_else(|| ControllerError::NotFound(format!("with id {}", id)))
    }

    fn fetch_pod_by_name(&self, name: &str) -> Result<Option<Pod>, ControllerError> {
        let connection = self.get_connection()?;
        Ok(PodRecords::find_by_name(&connection, name)?)
    }

    fn fetch_all_pods(&self) -> Result<Vec<Pod>, ControllerError> {
        let connection = self.get_connection()?;
        Ok(PodRecords::find_all(&connection)?)
    }

    fn fetch_pods_by_status(&self, status: SyncStatus) -> Result<Vec<Pod>, ControllerError> {
        let connection = self.get_connection()?;
        Ok(PodRecords::find_by_sync_status(&connection, status)?)
    }

    fn update_pod(&self, pod: &Pod) -> Result<(), ControllerError> {
        let mut connection = self.get_connection()?;
        let transaction = connection.transaction()?;

        let updated = PodRecords::update(&transaction, pod).map_err(|e| map_write_error(e, &pod.name))?;
        if updated == 0 {
            return Err(ControllerError::NotFound(format!("with id {}", pod.id)));
        }
        // children are replaced, never merged
        PodRecords::delete_children(&transaction, pod.id)?;
        PodRecords::insert_children(&transaction, pod.id, &pod.ports, &pod.envs)
            .map_err(|e| map_write_error(e, &pod.name))?;

        transaction.commit()?;
        Ok(())
    }

    fn delete_pod(&self, id: i64) -> Result<(), ControllerError> {
        let mut connection = self.get_connection()?;
        let transaction = connection.transaction()?;

        PodRecords::delete_children(&transaction, id)?;
        if PodRecords::delete(&transaction, id)? == 0 {
            return Err(ControllerError::NotFound(format!("with id {}", id)));
        }

        transaction.commit()?;
        Ok(())
    }

    fn mark_sync_status(&self, id: i64, status: SyncStatus) -> Result<(), ControllerError> {
        let connection = self.get_connection()?;
        match PodRecords::set_sync_status(&connection, id, status)? {
            0 => Err(ControllerError::NotFound(format!("with id {}", id))),
            _ => Ok(()),
        }
    }
}
