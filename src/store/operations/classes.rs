use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::constants::INVITE_CODE_LEN;
use crate::store::keys;
use crate::store::{Store, StoreError};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Class {
    pub id: String,
    pub owner_id: String,
    pub name: String,
    pub invite_code: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassMember {
    pub class_id: String,
    pub user_id: String,
    pub joined_at: DateTime<Utc>,
}

/// Codes avoid 0/O and 1/I to survive being read out loud.
const CODE_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

pub fn generate_invite_code() -> String {
    let mut rng = rand::thread_rng();
    (0..INVITE_CODE_LEN)
        .map(|_| CODE_ALPHABET[rng.gen_range(0..CODE_ALPHABET.len())] as char)
        .collect()
}

impl Store {
    /// Create a class, claiming its invite code via CAS. Collisions get a
    /// fresh code and retry a few times before giving up.
    pub fn create_class(&self, class: &Class) -> Result<(), StoreError> {
        let code_key = keys::class_code_index_key(&class.invite_code);

        let cas_result = self
            .classes
            .compare_and_swap(
                code_key.as_bytes(),
                None::<&[u8]>,
                Some(class.id.as_bytes().to_vec()),
            )
            .map_err(StoreError::Sled)?;

        if cas_result.is_err() {
            return Err(StoreError::Conflict {
                entity: "invite_code".to_string(),
                key: class.invite_code.clone(),
            });
        }

        let class_key = keys::class_key(&class.id);
        if let Err(e) = self
            .classes
            .insert(class_key.as_bytes(), Self::serialize(class)?)
        {
            let _ = self.classes.remove(code_key.as_bytes());
            return Err(StoreError::Sled(e));
        }

        Ok(())
    }

    pub fn get_class(&self, class_id: &str) -> Result<Option<Class>, StoreError> {
        let key = keys::class_key(class_id);
        match self.classes.get(key.as_bytes())? {
            Some(raw) => Ok(Some(Self::deserialize(&raw)?)),
            None => Ok(None),
        }
    }

    pub fn get_class_by_code(&self, invite_code: &str) -> Result<Option<Class>, StoreError> {
        let code_key = keys::class_code_index_key(invite_code);
        let Some(class_id_raw) = self.classes.get(code_key.as_bytes())? else {
            return Ok(None);
        };
        let class_id = match String::from_utf8(class_id_raw.to_vec()) {
            Ok(id) => id,
            Err(e) => {
                tracing::warn!(error = %e, "Invalid UTF-8 in invite code index");
                return Ok(None);
            }
        };
        self.get_class(&class_id)
    }

    pub fn list_classes_by_owner(&self, owner_id: &str) -> Result<Vec<Class>, StoreError> {
        let mut classes = Vec::new();
        for item in self.classes.scan_prefix(keys::CLASS_KEY_PREFIX.as_bytes()) {
            let (_, value) = item?;
            let class = Self::deserialize::<Class>(&value)?;
            if class.owner_id == owner_id {
                classes.push(class);
            }
        }
        Ok(classes)
    }

    /// Add a member with both lookup directions written atomically.
    pub fn add_class_member(&self, member: &ClassMember) -> Result<(), StoreError> {
        let member_key = keys::class_member_key(&member.class_id, &member.user_id);
        let index_key = keys::member_class_index_key(&member.user_id, &member.class_id);
        let member_bytes = Self::serialize(member)?;

        let member_key_bytes = member_key.as_bytes().to_vec();
        let index_key_bytes = index_key.as_bytes().to_vec();
        self.class_members
            .transaction(move |tx| {
                tx.insert(member_key_bytes.as_slice(), member_bytes.as_slice())?;
                tx.insert(index_key_bytes.as_slice(), &[] as &[u8])?;
                Ok(())
            })
            .map_err(|e: sled::transaction::TransactionError<()>| match e {
                sled::transaction::TransactionError::Abort(()) => {
                    StoreError::Sled(sled::Error::Unsupported("transaction aborted".into()))
                }
                sled::transaction::TransactionError::Storage(se) => StoreError::Sled(se),
            })?;
        Ok(())
    }

    pub fn is_class_member(&self, class_id: &str, user_id: &str) -> Result<bool, StoreError> {
        let key = keys::class_member_key(class_id, user_id);
        Ok(self.class_members.get(key.as_bytes())?.is_some())
    }

    pub fn list_class_members(&self, class_id: &str) -> Result<Vec<ClassMember>, StoreError> {
        let prefix = keys::class_member_prefix(class_id);
        let mut members = Vec::new();
        for item in self.class_members.scan_prefix(prefix.as_bytes()) {
            let (_, value) = item?;
            members.push(Self::deserialize::<ClassMember>(&value)?);
        }
        Ok(members)
    }

    pub fn list_user_class_ids(&self, user_id: &str) -> Result<Vec<String>, StoreError> {
        let prefix = keys::member_class_prefix(user_id);
        let mut class_ids = Vec::new();
        for item in self.class_members.scan_prefix(prefix.as_bytes()) {
            let (k, _) = item?;
            let key_str = String::from_utf8(k.to_vec()).unwrap_or_default();
            if let Some(class_id) = key_str.rsplit(':').next() {
                class_ids.push(class_id.to_string());
            }
        }
        Ok(class_ids)
    }
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;

    fn sample_class(id: &str, code: &str) -> Class {
        let now = Utc::now();
        Class {
            id: id.to_string(),
            owner_id: "teacher1".to_string(),
            name: "Biology 101".to_string(),
            invite_code: code.to_string(),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn invite_code_lookup_is_case_insensitive() {
        let dir = tempdir().unwrap();
        let store = Store::open(dir.path().join("db").to_str().unwrap()).unwrap();

        store.create_class(&sample_class("c1", "AB23CD")).unwrap();
        let found = store.get_class_by_code("ab23cd").unwrap().unwrap();
        assert_eq!(found.id, "c1");
    }

    #[test]
    fn duplicate_invite_code_is_rejected() {
        let dir = tempdir().unwrap();
        let store = Store::open(dir.path().join("db").to_str().unwrap()).unwrap();

        store.create_class(&sample_class("c1", "AB23CD")).unwrap();
        let err = store.create_class(&sample_class("c2", "AB23CD")).unwrap_err();
        assert!(matches!(err, StoreError::Conflict { .. }));
    }

    #[test]
    fn membership_is_visible_from_both_directions() {
        let dir = tempdir().unwrap();
        let store = Store::open(dir.path().join("db").to_str().unwrap()).unwrap();

        store.create_class(&sample_class("c1", "AB23CD")).unwrap();
        store
            .add_class_member(&ClassMember {
                class_id: "c1".to_string(),
                user_id: "s1".to_string(),
                joined_at: Utc::now(),
            })
            .unwrap();

        assert!(store.is_class_member("c1", "s1").unwrap());
        assert_eq!(store.list_user_class_ids("s1").unwrap(), vec!["c1"]);
        assert_eq!(store.list_class_members("c1").unwrap().len(), 1);
    }

    #[test]
    fn generated_codes_use_safe_alphabet() {
        for _ in 0..50 {
            let code = generate_invite_code();
            assert_eq!(code.len(), INVITE_CODE_LEN);
            assert!(code.bytes().all(|b| CODE_ALPHABET.contains(&b)));
        }
    }
}
