use member_map_shared::models::{Owner, Profile, ValidProfileInput};
use redb::{
    Database, ReadableDatabase, ReadableTable, ReadableTableMetadata, TableDefinition,
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

/// Account id -> profile JSON. One profile per account.
const PROFILES_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("profiles");
/// Account id -> account JSON, refreshed from the session on each request.
const ACCOUNTS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("accounts");

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("database error: {0}")]
    Database(#[from] redb::Error),
    #[error("corrupt record: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

fn db<E: Into<redb::Error>>(e: E) -> StorageError {
    StorageError::Database(e.into())
}

/// The owning account of a profile, as last seen from the auth proxy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub id: String,
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
    pub email: Option<String>,
}

impl Account {
    fn owner(&self) -> Owner {
        Owner {
            display_name: self.display_name.clone(),
            avatar_url: self.avatar_url.clone(),
            email: self.email.clone(),
        }
    }
}

pub struct Storage {
    db: Database,
}

impl Storage {
    pub fn open(path: &Path) -> Result<Arc<Self>, StorageError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let database = Database::create(path).map_err(db)?;

        // Ensure tables exist
        let write_txn = database.begin_write().map_err(db)?;
        {
            write_txn.open_table(PROFILES_TABLE).map_err(db)?;
            write_txn.open_table(ACCOUNTS_TABLE).map_err(db)?;
        }
        write_txn.commit().map_err(db)?;

        tracing::info!(path = %path.display(), "Opened profile store");
        Ok(Arc::new(Storage { db: database }))
    }

    pub fn upsert_account(&self, account: &Account) -> Result<(), StorageError> {
        let json = serde_json::to_vec(account)?;
        let write_txn = self.db.begin_write().map_err(db)?;
        {
            let mut table = write_txn.open_table(ACCOUNTS_TABLE).map_err(db)?;
            table
                .insert(account.id.as_str(), json.as_slice())
                .map_err(db)?;
        }
        write_txn.commit().map_err(db)?;
        Ok(())
    }

    /// Create the account's profile, or overwrite every field of the
    /// existing one. The profile id and creation time survive updates.
    pub fn upsert_profile(
        &self,
        account_id: &str,
        input: &ValidProfileInput,
        now: &str,
    ) -> Result<Profile, StorageError> {
        let write_txn = self.db.begin_write().map_err(db)?;
        let profile = {
            let mut table = write_txn.open_table(PROFILES_TABLE).map_err(db)?;
            let existing: Option<Profile> = match table.get(account_id).map_err(db)? {
                Some(value) => Some(serde_json::from_slice(value.value())?),
                None => None,
            };

            let (id, created_at) = match existing {
                Some(p) => (p.id, p.created_at),
                None => (uuid::Uuid::new_v4().to_string(), now.to_string()),
            };
            let profile = Profile {
                id,
                name: input.name.clone(),
                program: input.program.clone(),
                graduation_year: input.graduation_year.clone(),
                current_term: input.current_term.clone(),
                location: input.location.clone(),
                latitude: input.latitude,
                longitude: input.longitude,
                owner: Owner::default(),
                created_at,
                updated_at: now.to_string(),
            };

            let json = serde_json::to_vec(&profile)?;
            table.insert(account_id, json.as_slice()).map_err(db)?;
            profile
        };
        let owner = {
            let accounts = write_txn.open_table(ACCOUNTS_TABLE).map_err(db)?;
            let account: Option<Account> = match accounts.get(account_id).map_err(db)? {
                Some(value) => Some(serde_json::from_slice(value.value())?),
                None => None,
            };
            account.map(|a| a.owner()).unwrap_or_default()
        };
        write_txn.commit().map_err(db)?;

        Ok(Profile { owner, ..profile })
    }

    pub fn get_profile(&self, account_id: &str) -> Result<Option<Profile>, StorageError> {
        let read_txn = self.db.begin_read().map_err(db)?;
        let table = read_txn.open_table(PROFILES_TABLE).map_err(db)?;
        let mut profile: Profile = match table.get(account_id).map_err(db)? {
            Some(value) => serde_json::from_slice(value.value())?,
            None => return Ok(None),
        };

        let accounts = read_txn.open_table(ACCOUNTS_TABLE).map_err(db)?;
        if let Some(value) = accounts.get(account_id).map_err(db)? {
            let account: Account = serde_json::from_slice(value.value())?;
            profile.owner = account.owner();
        }
        Ok(Some(profile))
    }

    /// Every stored profile with its owner joined in, oldest first.
    pub fn list_profiles(&self) -> Result<Vec<Profile>, StorageError> {
        let read_txn = self.db.begin_read().map_err(db)?;
        let table = read_txn.open_table(PROFILES_TABLE).map_err(db)?;
        let accounts = read_txn.open_table(ACCOUNTS_TABLE).map_err(db)?;

        let mut profiles = Vec::new();
        for entry in table.iter().map_err(db)? {
            let (key, value) = entry.map_err(db)?;
            let mut profile: Profile = serde_json::from_slice(value.value())?;
            if let Some(acc) = accounts.get(key.value()).map_err(db)? {
                let account: Account = serde_json::from_slice(acc.value())?;
                profile.owner = account.owner();
            }
            profiles.push(profile);
        }

        profiles.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.id.cmp(&b.id))
        });
        Ok(profiles)
    }

    pub fn count_profiles(&self) -> Result<u64, StorageError> {
        let read_txn = self.db.begin_read().map_err(db)?;
        let table = read_txn.open_table(PROFILES_TABLE).map_err(db)?;
        table.len().map_err(db)
    }
}
