use artifortress_types::{PersonalAccessToken, RepoType, Repository, RoleBinding};

use crate::db::InMemoryMetadataStore;
use crate::error::MetaError;

impl InMemoryMetadataStore {
    pub fn insert_repository(&self, repo: Repository) -> Result<(), MetaError> {
        let key = (repo.tenant_id.clone(), repo.repo_key.clone());
        let mut repo_keys = self.repo_keys.lock().unwrap();
        if repo_keys.contains_key(&key) {
            return Err(MetaError::UniqueViolation {
                constraint: "repos(tenant_id, repo_key)".to_string(),
            });
        }
        repo_keys.insert(key, repo.repo_id.clone());
        self.repos.lock().unwrap().insert(repo.repo_id.clone(), repo);
        Ok(())
    }

    pub fn get_repository(&self, repo_id: &str) -> Result<Repository, MetaError> {
        self.repos
            .lock()
            .unwrap()
            .get(repo_id)
            .cloned()
            .ok_or_else(|| MetaError::NotFound(format!("repository {repo_id}")))
    }

    pub fn find_repository_by_key(
        &self,
        tenant_id: &str,
        repo_key: &str,
    ) -> Result<Repository, MetaError> {
        let repo_id = self
            .repo_keys
            .lock()
            .unwrap()
            .get(&(tenant_id.to_string(), repo_key.to_string()))
            .cloned()
            .ok_or_else(|| MetaError::NotFound(format!("repository {repo_key}")))?;
        self.get_repository(&repo_id)
    }

    pub fn list_repositories_for_tenant(&self, tenant_id: &str) -> Vec<Repository> {
        self.repos
            .lock()
            .unwrap()
            .values()
            .filter(|r| r.tenant_id == tenant_id)
            .cloned()
            .collect()
    }

    /// Validates virtual-repo membership invariants: no
    /// self-reference, no cycles, members must exist.
    pub fn validate_virtual_members(
        &self,
        tenant_id: &str,
        repo_key: &str,
        members: &[String],
    ) -> Result<(), MetaError> {
        if members.iter().any(|m| m == repo_key) {
            return Err(MetaError::UniqueViolation {
                constraint: "virtual repo must not reference itself".to_string(),
            });
        }
        for member in members {
            let resolved = self.find_repository_by_key(tenant_id, member)?;
            if resolved.repo_type == RepoType::Virtual
                && resolved.virtual_members.iter().any(|m| m == repo_key)
            {
                return Err(MetaError::UniqueViolation {
                    constraint: "virtual repo membership must not cycle".to_string(),
                });
            }
        }
        Ok(())
    }

    pub fn delete_repository(&self, repo_id: &str) -> Result<(), MetaError> {
        let mut repos = self.repos.lock().unwrap();
        let repo = repos
            .remove(repo_id)
            .ok_or_else(|| MetaError::NotFound(format!("repository {repo_id}")))?;
        self.repo_keys.lock().unwrap().remove(&(repo.tenant_id, repo.repo_key));
        Ok(())
    }

    pub fn insert_pat(&self, pat: PersonalAccessToken) -> Result<(), MetaError> {
        let mut by_hash = self.pats_by_hash.lock().unwrap();
        if by_hash.contains_key(&pat.token_hash) {
            return Err(MetaError::UniqueViolation {
                constraint: "pats(token_hash)".to_string(),
            });
        }
        by_hash.insert(pat.token_hash.clone(), pat.token_id.clone());
        self.pats.lock().unwrap().insert(pat.token_id.clone(), pat);
        Ok(())
    }

    pub fn find_pat_by_hash(&self, token_hash: &str) -> Option<PersonalAccessToken> {
        let token_id = self.pats_by_hash.lock().unwrap().get(token_hash).cloned()?;
        self.pats.lock().unwrap().get(&token_id).cloned()
    }

    pub fn revoke_pat(&self, token_id: &str, revoked_at: chrono::DateTime<chrono::Utc>) -> Result<(), MetaError> {
        let mut pats = self.pats.lock().unwrap();
        let pat = pats
            .get_mut(token_id)
            .ok_or_else(|| MetaError::NotFound(format!("pat {token_id}")))?;
        pat.revoked_at = Some(revoked_at);
        Ok(())
    }

    pub fn upsert_role_binding(&self, binding: RoleBinding) -> Result<(), MetaError> {
        self.role_bindings
            .lock()
            .unwrap()
            .insert((binding.repo_id.clone(), binding.subject.clone()), binding);
        Ok(())
    }

    pub fn find_role_binding(&self, repo_id: &str, subject: &str) -> Option<RoleBinding> {
        self.role_bindings
            .lock()
            .unwrap()
            .get(&(repo_id.to_string(), subject.to_string()))
            .cloned()
    }

    pub fn list_role_bindings_for_subject(&self, subject: &str) -> Vec<RoleBinding> {
        self.role_bindings
            .lock()
            .unwrap()
            .values()
            .filter(|b| b.subject == subject)
            .cloned()
            .collect()
    }
}
