use super::{StoredScope, ValidatorStorage};
use semaccount_types::{Commitment, ScopeId, SemaError, SemaResult, WORD_SIZE};
use tracing::debug;

fn member_key(scope: &ScopeId, index: u64) -> [u8; WORD_SIZE + 8] {
    let mut key = [0u8; WORD_SIZE + 8];
    key[..WORD_SIZE].copy_from_slice(scope.as_bytes());
    key[WORD_SIZE..].copy_from_slice(&index.to_be_bytes());
    key
}

impl ValidatorStorage {
    pub fn store_scope(&self, record: &StoredScope) -> SemaResult<()> {
        let value = bincode::serialize(record)
            .map_err(|e| SemaError::Storage(format!("Failed to serialize scope: {}", e)))?;

        self.scopes
            .insert(record.scope.as_bytes(), value)
            .map_err(|e| SemaError::Storage(format!("Failed to store scope: {}", e)))?;

        debug!("Stored scope {} (depth {})", record.scope, record.depth);
        Ok(())
    }

    pub fn load_scope(&self, scope: &ScopeId) -> SemaResult<Option<StoredScope>> {
        match self
            .scopes
            .get(scope.as_bytes())
            .map_err(|e| SemaError::Storage(format!("Failed to load scope: {}", e)))?
        {
            Some(bytes) => {
                let record = bincode::deserialize(&bytes)
                    .map_err(|e| SemaError::Storage(format!("Failed to deserialize scope: {}", e)))?;
                Ok(Some(record))
            }
            None => Ok(None),
        }
    }

    pub fn load_scopes(&self) -> SemaResult<Vec<StoredScope>> {
        let mut results = Vec::new();
        for entry in self.scopes.iter() {
            let (_, value) = entry
                .map_err(|e| SemaError::Storage(format!("Failed to iterate scopes: {}", e)))?;
            let record: StoredScope = bincode::deserialize(&value)
                .map_err(|e| SemaError::Storage(format!("Failed to deserialize scope: {}", e)))?;
            results.push(record);
        }
        Ok(results)
    }

    pub fn store_member(&self, scope: &ScopeId, index: u64, commitment: &Commitment) -> SemaResult<()> {
        self.members
            .insert(member_key(scope, index), commitment.as_bytes().as_slice())
            .map_err(|e| SemaError::Storage(format!("Failed to store member: {}", e)))?;
        Ok(())
    }

    /// Members of `scope` in leaf order.
    pub fn load_members(&self, scope: &ScopeId) -> SemaResult<Vec<Commitment>> {
        let mut members = Vec::new();

        for (expected, entry) in self.members.scan_prefix(scope.as_bytes()).enumerate() {
            let (key, value) = entry
                .map_err(|e| SemaError::Storage(format!("Failed to iterate members: {}", e)))?;

            let index_bytes: [u8; 8] = key[WORD_SIZE..]
                .try_into()
                .map_err(|_| SemaError::Storage("Invalid member key".into()))?;
            if u64::from_be_bytes(index_bytes) != expected as u64 {
                return Err(SemaError::Storage(format!(
                    "Member list for scope {} has a gap at index {}",
                    scope, expected
                )));
            }

            let word: [u8; WORD_SIZE] = value
                .as_ref()
                .try_into()
                .map_err(|_| SemaError::Storage("Invalid member value".into()))?;
            members.push(Commitment::from_bytes(word));
        }

        Ok(members)
    }
}
