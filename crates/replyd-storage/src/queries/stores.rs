// SPDX-FileCopyrightText: 2026 replyd Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Store and account registry operations.

use replyd_core::types::{Account, NewAccount, Store};
use replyd_core::ReplydError;
use rusqlite::{params, Row};

use super::optional;
use crate::database::{map_tr_err, Database};

fn store_from_row(row: &Row<'_>) -> rusqlite::Result<Store> {
    Ok(Store {
        id: row.get(0)?,
        name: row.get(1)?,
        created_at: row.get(2)?,
    })
}

fn account_from_row(row: &Row<'_>) -> rusqlite::Result<Account> {
    Ok(Account {
        id: row.get(0)?,
        store_id: row.get(1)?,
        platform: row.get(2)?,
        login_name: row.get(3)?,
        encrypted_credential: row.get(4)?,
        created_at: row.get(5)?,
    })
}

const ACCOUNT_COLUMNS: &str =
    "id, store_id, platform, login_name, encrypted_credential, created_at";

pub async fn create_store(db: &Database, name: &str) -> Result<Store, ReplydError> {
    let name = name.to_string();
    db.connection()
        .call(move |conn| {
            conn.query_row(
                "INSERT INTO stores (name) VALUES (?1) RETURNING id, name, created_at",
                params![name],
                store_from_row,
            )
        })
        .await
        .map_err(map_tr_err)
}

pub async fn list_stores(db: &Database) -> Result<Vec<Store>, ReplydError> {
    db.connection()
        .call(|conn| {
            let mut stmt = conn.prepare("SELECT id, name, created_at FROM stores ORDER BY id")?;
            let rows = stmt.query_map([], store_from_row)?;
            rows.collect::<rusqlite::Result<Vec<_>>>()
        })
        .await
        .map_err(map_tr_err)
}

/// Register an account. Fails if the store does not exist.
pub async fn create_account(db: &Database, account: &NewAccount) -> Result<Account, ReplydError> {
    let account = account.clone();
    db.connection()
        .call(move |conn| {
            conn.query_row(
                &format!(
                    "INSERT INTO accounts (store_id, platform, login_name, encrypted_credential)
                     VALUES (?1, ?2, ?3, ?4)
                     RETURNING {ACCOUNT_COLUMNS}"
                ),
                params![
                    account.store_id,
                    account.platform,
                    account.login_name,
                    account.encrypted_credential
                ],
                account_from_row,
            )
        })
        .await
        .map_err(map_tr_err)
}

pub async fn get_account(db: &Database, id: i64) -> Result<Option<Account>, ReplydError> {
    db.connection()
        .call(move |conn| {
            optional(conn.query_row(
                &format!("SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE id = ?1"),
                params![id],
                account_from_row,
            ))
        })
        .await
        .map_err(map_tr_err)
}

pub async fn list_accounts(db: &Database) -> Result<Vec<Account>, ReplydError> {
    db.connection()
        .call(|conn| {
            let mut stmt =
                conn.prepare(&format!("SELECT {ACCOUNT_COLUMNS} FROM accounts ORDER BY id"))?;
            let rows = stmt.query_map([], account_from_row)?;
            rows.collect::<rusqlite::Result<Vec<_>>>()
        })
        .await
        .map_err(map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queries::test_support::setup_db;

    fn new_account(store_id: i64, login: &str) -> NewAccount {
        NewAccount {
            store_id,
            platform: "mock".into(),
            login_name: login.into(),
            encrypted_credential: "sealed".into(),
        }
    }

    #[tokio::test]
    async fn store_and_account_lifecycle() {
        let (db, _dir) = setup_db().await;

        let store = create_store(&db, "을지로 본점").await.unwrap();
        assert!(store.id > 0);
        assert_eq!(store.name, "을지로 본점");
        assert!(store.created_at.ends_with('Z'));

        let account = create_account(&db, &new_account(store.id, "owner@example.com"))
            .await
            .unwrap();
        assert_eq!(account.store_id, store.id);
        assert_eq!(account.platform, "mock");
        assert_eq!(account.encrypted_credential, "sealed");

        let fetched = get_account(&db, account.id).await.unwrap().unwrap();
        assert_eq!(fetched, account);
        assert!(get_account(&db, account.id + 100).await.unwrap().is_none());

        assert_eq!(list_stores(&db).await.unwrap(), vec![store]);
        assert_eq!(list_accounts(&db).await.unwrap(), vec![account]);
    }

    #[tokio::test]
    async fn account_requires_existing_store() {
        let (db, _dir) = setup_db().await;
        let result = create_account(&db, &new_account(42, "nobody")).await;
        assert!(matches!(result, Err(ReplydError::Storage { .. })));
        assert!(list_accounts(&db).await.unwrap().is_empty());
    }
}
