//! Local JSON-file backend
//!
//! Each table lives in `data/<table>.json` as an array of rows. Rows are
//! cached in memory keyed by `(owner, id)` and every mutation is applied to
//! a working copy of the table, checked, written to disk atomically and only
//! then committed to the cache. A failed batch leaves the table untouched.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::RwLock;

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;
use uuid::Uuid;

use super::file_io::{read_json, write_json_atomic};
use super::query::{Filter, Order};
use super::record::{Record, Table};
use super::{Authenticator, Backend};
use crate::config::paths::VaultPaths;
use crate::crypto::SessionStore;
use crate::error::{VaultError, VaultResult};
use crate::models::UserId;

/// Session entry naming the signed-in user
pub const CURRENT_USER_ENTRY: &str = "current_user";

type Rows = BTreeMap<(UserId, Uuid), Value>;

/// Backend storing every table as a JSON file under the data directory
pub struct JsonBackend<S: SessionStore> {
    paths: VaultPaths,
    session: S,
    tables: RwLock<HashMap<Table, Rows>>,
}

impl<S: SessionStore> JsonBackend<S> {
    /// Open the backend, loading every table from disk
    pub fn open(paths: VaultPaths, session: S) -> VaultResult<Self> {
        paths.ensure_directories()?;

        let mut tables = HashMap::new();
        for table in Table::ALL {
            let stored: Vec<Value> = read_json(paths.table_file(table))?;
            let mut rows = Rows::new();
            for row in stored {
                rows.insert(row_key(table, &row)?, row);
            }
            debug!(table = table.name(), rows = rows.len(), "loaded table");
            tables.insert(table, rows);
        }

        Ok(Self {
            paths,
            session,
            tables: RwLock::new(tables),
        })
    }

    /// Get the paths configuration
    pub fn paths(&self) -> &VaultPaths {
        &self.paths
    }

    /// Session storage shared with the encryption context
    pub fn session(&self) -> &S {
        &self.session
    }

    /// Start a session as `user`
    pub fn sign_in(&self, user: &UserId) -> VaultResult<()> {
        if user.as_str().trim().is_empty() {
            return Err(VaultError::Validation("User id cannot be empty".into()));
        }
        self.session.set(CURRENT_USER_ENTRY, user.as_str())
    }

    /// End the current session's identity
    pub fn sign_out(&self) -> VaultResult<()> {
        self.session.remove(CURRENT_USER_ENTRY)
    }

    fn signed_in(&self) -> VaultResult<UserId> {
        self.session
            .get(CURRENT_USER_ENTRY)?
            .map(UserId::new)
            .ok_or(VaultError::NotAuthenticated)
    }

    /// Apply `change` to a copy of `table`, persist it, then commit it
    fn mutate<T, F>(&self, table: Table, change: F) -> VaultResult<T>
    where
        F: FnOnce(&mut Rows, &HashMap<Table, Rows>) -> VaultResult<T>,
    {
        let mut tables = self
            .tables
            .write()
            .map_err(|e| VaultError::Backend(format!("Failed to acquire write lock: {}", e)))?;

        let mut working = tables.get(&table).cloned().unwrap_or_default();
        let outcome = change(&mut working, &tables)?;

        let stored: Vec<&Value> = working.values().collect();
        write_json_atomic(self.paths.table_file(table), &stored)?;

        tables.insert(table, working);
        Ok(outcome)
    }
}

impl<S: SessionStore> Authenticator for JsonBackend<S> {
    fn sign_in(&self, user: &UserId) -> VaultResult<()> {
        JsonBackend::sign_in(self, user)
    }

    fn sign_out(&self) -> VaultResult<()> {
        JsonBackend::sign_out(self)
    }
}

#[async_trait]
impl<S: SessionStore> Backend for JsonBackend<S> {
    async fn current_user(&self) -> VaultResult<Option<UserId>> {
        Ok(self.session.get(CURRENT_USER_ENTRY)?.map(UserId::new))
    }

    async fn select<R: Record>(
        &self,
        filter: &Filter,
        order: Option<&Order>,
    ) -> VaultResult<Vec<R>> {
        let user = self.signed_in()?;
        let tables = self
            .tables
            .read()
            .map_err(|e| VaultError::Backend(format!("Failed to acquire read lock: {}", e)))?;

        let mut rows: Vec<&Value> = tables
            .get(&R::TABLE)
            .map(|rows| {
                rows.iter()
                    .filter(|((owner, _), row)| *owner == user && filter.matches(row))
                    .map(|(_, row)| row)
                    .collect()
            })
            .unwrap_or_default();

        if let Some(order) = order {
            rows.sort_by(|a, b| order.compare(a, b));
        }

        rows.into_iter()
            .map(|row| {
                serde_json::from_value(row.clone()).map_err(|e| {
                    VaultError::Backend(format!("Malformed row in {}: {}", R::TABLE, e))
                })
            })
            .collect()
    }

    async fn insert<R: Record>(&self, rows: &[R]) -> VaultResult<()> {
        let user = self.signed_in()?;
        self.mutate(R::TABLE, |working, tables| {
            for record in rows {
                let (key, row) = owned_row(&user, record)?;
                if working.contains_key(&key) {
                    return Err(VaultError::Conflict {
                        table: R::TABLE.name(),
                        constraint: format!("{}_pkey", R::TABLE.name()),
                    });
                }
                check_constraints(R::TABLE, &key, &row, working, tables)?;
                working.insert(key, row);
            }
            Ok(())
        })?;
        debug!(table = R::TABLE.name(), count = rows.len(), "inserted rows");
        Ok(())
    }

    async fn update<R: Record>(&self, record: &R) -> VaultResult<bool> {
        let user = self.signed_in()?;
        self.mutate(R::TABLE, |working, tables| {
            let (key, row) = owned_row(&user, record)?;
            if !working.contains_key(&key) {
                return Ok(false);
            }
            check_constraints(R::TABLE, &key, &row, working, tables)?;
            working.insert(key, row);
            Ok(true)
        })
    }

    async fn upsert<R: Record>(&self, rows: &[R]) -> VaultResult<()> {
        let user = self.signed_in()?;
        self.mutate(R::TABLE, |working, tables| {
            for record in rows {
                let (key, row) = owned_row(&user, record)?;
                check_constraints(R::TABLE, &key, &row, working, tables)?;
                working.insert(key, row);
            }
            Ok(())
        })?;
        debug!(table = R::TABLE.name(), count = rows.len(), "upserted rows");
        Ok(())
    }

    async fn delete<R: Record>(&self, filter: &Filter) -> VaultResult<usize> {
        let user = self.signed_in()?;
        let removed = self.mutate(R::TABLE, |working, tables| {
            let doomed: Vec<(UserId, Uuid)> = working
                .iter()
                .filter(|((owner, _), row)| *owner == user && filter.matches(row))
                .map(|(key, _)| key.clone())
                .collect();

            if R::TABLE == Table::ResourceCategories && !doomed.is_empty() {
                let ids: HashSet<Uuid> = doomed.iter().map(|(_, id)| *id).collect();
                restrict_category_delete(&user, &ids, tables)?;
            }

            for key in &doomed {
                working.remove(key);
            }
            Ok(doomed.len())
        })?;
        debug!(table = R::TABLE.name(), count = removed, "deleted rows");
        Ok(removed)
    }
}

/// Serialize a record after checking it belongs to `user`
fn owned_row<R: Record>(user: &UserId, record: &R) -> VaultResult<((UserId, Uuid), Value)> {
    if record.owner() != user {
        return Err(VaultError::RowLevelSecurity {
            table: R::TABLE.name(),
        });
    }
    let row = serde_json::to_value(record)
        .map_err(|e| VaultError::Backend(format!("Failed to encode {} row: {}", R::TABLE, e)))?;
    Ok(((user.clone(), record.id()), row))
}

fn row_key(table: Table, row: &Value) -> VaultResult<(UserId, Uuid)> {
    let owner = row
        .get("user_id")
        .and_then(Value::as_str)
        .ok_or_else(|| VaultError::Backend(format!("{} row without user_id", table)))?;
    let id = row
        .get("id")
        .and_then(Value::as_str)
        .and_then(|s| Uuid::parse_str(s).ok())
        .ok_or_else(|| VaultError::Backend(format!("{} row without a valid id", table)))?;
    Ok((UserId::new(owner), id))
}

fn check_constraints(
    table: Table,
    key: &(UserId, Uuid),
    row: &Value,
    working: &Rows,
    tables: &HashMap<Table, Rows>,
) -> VaultResult<()> {
    match table {
        Table::ServiceNotes => {
            let service = row.get("service_name");
            let taken = working.iter().any(|((owner, id), other)| {
                *owner == key.0 && *id != key.1 && other.get("service_name") == service
            });
            if taken {
                return Err(VaultError::Conflict {
                    table: table.name(),
                    constraint: "service_notes_user_id_service_name_key".into(),
                });
            }
        }
        Table::Resources => {
            let category = row
                .get("category_id")
                .and_then(Value::as_str)
                .and_then(|s| Uuid::parse_str(s).ok());
            let present = category.is_some_and(|category| {
                tables
                    .get(&Table::ResourceCategories)
                    .is_some_and(|rows| rows.contains_key(&(key.0.clone(), category)))
            });
            if !present {
                return Err(VaultError::ForeignKey {
                    table: table.name(),
                    detail: format!(
                        "category_id {} is not present in resource_categories",
                        row.get("category_id").unwrap_or(&Value::Null)
                    ),
                });
            }
        }
        Table::ApiKeys | Table::ResourceCategories => {}
    }
    Ok(())
}

fn restrict_category_delete(
    user: &UserId,
    ids: &HashSet<Uuid>,
    tables: &HashMap<Table, Rows>,
) -> VaultResult<()> {
    let referenced = tables.get(&Table::Resources).and_then(|rows| {
        rows.iter()
            .filter(|((owner, _), _)| owner == user)
            .filter_map(|(_, row)| row.get("category_id").and_then(Value::as_str))
            .filter_map(|s| Uuid::parse_str(s).ok())
            .find(|category| ids.contains(category))
    });

    match referenced {
        Some(category) => Err(VaultError::ForeignKey {
            table: Table::ResourceCategories.name(),
            detail: format!("category {} is still referenced by resources", category),
        }),
        None => Ok(()),
    }
}
