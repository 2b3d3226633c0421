use crate::api::ControllerError;

use definition::pod::{Pod, PodEnv, PodPort, Protocol, PullPolicy, RestartPolicy, SyncStatus};
use rusqlite::{params, Connection, OptionalExtension, Result, Row};
use std::path::PathBuf;
use std::sync::Arc;

const POD_COLUMNS: &str = "id, name, namespace, team_id, min_cpu, max_cpu, min_memory, max_memory, \
                           image, pull_policy, restart_policy, deploy_type, replicas, sync_status";

pub struct PodDataBase {
    location: PathBuf,
    name: String,
}

impl PodDataBase {
    pub fn new(location: PathBuf, name: String) -> Arc<PodDataBase> {
        Arc::new(PodDataBase { location, name })
    }

    pub fn init_tables(&self) -> Result<(), ControllerError> {
        std::fs::create_dir_all(&self.location)?;
        let connection = self.open()?;
        // only work with sqlite for now
        connection.execute_batch(
            "CREATE TABLE IF NOT EXISTS pod (
                id              INTEGER PRIMARY KEY AUTOINCREMENT,
                name            TEXT NOT NULL UNIQUE,
                namespace       TEXT NOT NULL,
                team_id         INTEGER NOT NULL DEFAULT 0,
                min_cpu         REAL,
                max_cpu         REAL,
                min_memory      REAL,
                max_memory      REAL,
                image           TEXT NOT NULL,
                pull_policy     TEXT NOT NULL DEFAULT 'IfNotPresent',
                restart_policy  TEXT NOT NULL DEFAULT 'Always',
                deploy_type     TEXT NOT NULL DEFAULT '',
                replicas        INTEGER NOT NULL,
                sync_status     TEXT NOT NULL DEFAULT 'pending'
            );
            CREATE TABLE IF NOT EXISTS pod_port (
                id              INTEGER PRIMARY KEY AUTOINCREMENT,
                pod_id          INTEGER NOT NULL REFERENCES pod (id) ON DELETE CASCADE,
                port            INTEGER NOT NULL,
                protocol        TEXT NOT NULL DEFAULT 'TCP'
            );
            CREATE TABLE IF NOT EXISTS pod_env (
                id              INTEGER PRIMARY KEY AUTOINCREMENT,
                pod_id          INTEGER NOT NULL REFERENCES pod (id) ON DELETE CASCADE,
                env_key         TEXT NOT NULL,
                env_value       TEXT NOT NULL,
                UNIQUE (pod_id, env_key)
            );
            CREATE INDEX IF NOT EXISTS pod_port_pod_id_index ON pod_port (pod_id);
            CREATE INDEX IF NOT EXISTS pod_env_pod_id_index ON pod_env (pod_id);
            CREATE INDEX IF NOT EXISTS pod_sync_status_index ON pod (sync_status);",
        )?;
        Ok(())
    }

    pub fn open(&self) -> Result<Connection> {
        let database_path = self.location.join(format!("{}.db", self.name));
        let connection = Connection::open(database_path)?;
        connection.pragma_update(None, "foreign_keys", "ON")?;
        Ok(connection)
    }
}

/// Raw SQL access to the pod tables. Callers own the transaction boundaries.
pub struct PodRecords {}
impl PodRecords {
    pub fn insert(connection: &Connection, pod: &Pod) -> Result<i64> {
        connection.execute(
            "INSERT INTO pod (name, namespace, team_id, min_cpu, max_cpu, min_memory, max_memory,
                              image, pull_policy, restart_policy, deploy_type, replicas, sync_status)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
            params![
                pod.name,
                pod.namespace,
                pod.team_id,
                pod.min_cpu,
                pod.max_cpu,
                pod.min_memory,
                pod.max_memory,
                pod.image,
                pod.pull_policy.to_string(),
                pod.restart_policy.to_string(),
                pod.deploy_type,
                pod.replicas,
                pod.sync_status.to_string(),
            ],
        )?;
        Ok(connection.last_insert_rowid())
    }

    pub fn insert_children(
        connection: &Connection,
        pod_id: i64,
        ports: &[PodPort],
        envs: &[PodEnv],
    ) -> Result<()> {
        let mut port_stmt =
            connection.prepare("INSERT INTO pod_port (pod_id, port, protocol) VALUES (?1, ?2, ?3)")?;
        for port in ports {
            port_stmt.execute(params![pod_id, port.port, port.protocol.to_string()])?;
        }

        let mut env_stmt = connection
            .prepare("INSERT INTO pod_env (pod_id, env_key, env_value) VALUES (?1, ?2, ?3)")?;
        for env in envs {
            env_stmt.execute(params![pod_id, env.key, env.value])?;
        }
        Ok(())
    }

    pub fn find_one(connection: &Connection, id: i64) -> Result<Option<Pod>> {
        let pod = connection
            .query_row(
                &format!("SELECT {} FROM pod WHERE id = ?1", POD_COLUMNS),
                params![id],
                pod_from_row,
            )
            .optional()?;
        pod.map(|pod| PodRecords::with_children(connection, pod))
            .transpose()
    }

    pub fn find_by_name(connection: &Connection, name: &str) -> Result<Option<Pod>> {
        let pod = connection
            .query_row(
                &format!("SELECT {} FROM pod WHERE name = ?1", POD_COLUMNS),
                params![name],
                pod_from_row,
            )
            .optional()?;
        pod.map(|pod| PodRecords::with_children(connection, pod))
            .transpose()
    }

    // TODO: add pagination
    pub fn find_all(connection: &Connection) -> Result<Vec<Pod>> {
        let mut stmt = connection.prepare(&format!("SELECT {} FROM pod ORDER BY id", POD_COLUMNS))?;
        let pods = stmt
            .query_map([], pod_from_row)?
            .collect::<Result<Vec<Pod>>>()?;
        pods.into_iter()
            .map(|pod| PodRecords::with_children(connection, pod))
            .collect()
    }

    pub fn find_by_sync_status(connection: &Connection, status: SyncStatus) -> Result<Vec<Pod>> {
        let mut stmt = connection.prepare(&format!(
            "SELECT {} FROM pod WHERE sync_status = ?1 ORDER BY id",
            POD_COLUMNS
        ))?;
        let pods = stmt
            .query_map(params![status.to_string()], pod_from_row)?
            .collect::<Result<Vec<Pod>>>()?;
        pods.into_iter()
            .map(|pod| PodRecords::with_children(connection, pod))
            .collect()
    }

    /// Returns the number of pod rows touched, `0` when the id is unknown
    pub fn update(connection: &Connection, pod: &Pod) -> Result<usize> {
        connection.execute(
            "UPDATE pod SET name = ?1, namespace = ?2, team_id = ?3, min_cpu = ?4, max_cpu = ?5,
                            min_memory = ?6, max_memory = ?7, image = ?8, pull_policy = ?9,
                            restart_policy = ?10, deploy_type = ?11, replicas = ?12, sync_status = ?13
             WHERE id = ?14",
            params![
                pod.name,
                pod.namespace,
                pod.team_id,
                pod.min_cpu,
                pod.max_cpu,
                pod.min_memory,
                pod.max_memory,
                pod.image,
                pod.pull_policy.to_string(),
                pod.restart_policy.to_string(),
                pod.deploy_type,
                pod.replicas,
                pod.sync_status.to_string(),
                pod.id,
            ],
        )
    }

    pub fn set_sync_status(connection: &Connection, id: i64, status: SyncStatus) -> Result<usize> {
        connection.execute(
            "UPDATE pod SET sync_status = ?1 WHERE id = ?2",
            params![status.to_string(), id],
        )
    }

    pub fn delete_children(connection: &Connection, pod_id: i64) -> Result<()> {
        connection.execute("DELETE FROM pod_port WHERE pod_id = ?1", params![pod_id])?;
        connection.execute("DELETE FROM pod_env WHERE pod_id = ?1", params![pod_id])?;
        Ok(())
    }

    pub fn delete(connection: &Connection, id: i64) -> Result<usize> {
        connection.execute("DELETE FROM pod WHERE id = ?1", params![id])
    }

    fn with_children(connection: &Connection, mut pod: Pod) -> Result<Pod> {
        let mut stmt =
            connection.prepare("SELECT port, protocol FROM pod_port WHERE pod_id = ?1 ORDER BY id")?;
        pod.ports = stmt
            .query_map(params![pod.id], |row| {
                let protocol: String = row.get(1)?;
                Ok(PodPort {
                    port: row.get(0)?,
                    protocol: Protocol::from(protocol.as_str()),
                })
            })?
            .collect::<Result<Vec<PodPort>>>()?;

        let mut stmt = connection
            .prepare("SELECT env_key, env_value FROM pod_env WHERE pod_id = ?1 ORDER BY id")?;
        pod.envs = stmt
            .query_map(params![pod.id], |row| {
                Ok(PodEnv {
                    key: row.get(0)?,
                    value: row.get(1)?,
                })
            })?
            .collect::<Result<Vec<PodEnv>>>()?;
        Ok(pod)
    }
}

fn pod_from_row(row: &Row) -> Result<Pod> {
    let pull_policy: String = row.get(9)?;
    let restart_policy: String = row.get(10)?;
    let sync_status: String = row.get(13)?;
    Ok(Pod {
        id: row.get(0)?,
        name: row.get(1)?,
        namespace: row.get(2)?,
        team_id: row.get(3)?,
        min_cpu: row.get(4)?,
        max_cpu: row.get(5)?,
        min_memory: row.get(6)?,
        max_memory: row.get(7)?,
        image: row.get(8)?,
        pull_policy: PullPolicy::from(pull_policy.as_str()),
        restart_policy: RestartPolicy::from(restart_policy.as_str()),
        deploy_type: row.get(11)?,
        replicas: row.get(12)?,
        ports: vec![],
        envs: vec![],
        sync_status: SyncStatus::from(sync_status.as_str()),
    })
}
