// SPDX-License-Identifier: MIT
use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use orc_types::{AgentContext, AgentStatus};
use uuid::Uuid;

use crate::error::RepoError;

/// Snapshot storage for [`AgentContext`], indexed by user id and status so
/// both filters in [`AgentContextRepository::list`] are O(matching) rather
/// than a full scan.
#[async_trait]
pub trait AgentContextRepository: Send + Sync {
    async fn save(&self, context: AgentContext) -> Result<(), RepoError>;
    async fn get(&self, agent_id: Uuid) -> Result<Option<AgentContext>, RepoError>;
    /// Full replace; re-keys the status index atomically with the record
    /// update if `status` changed.
    async fn update(&self, context: AgentContext) -> Result<(), RepoError>;
    async fn update_status(&self, agent_id: Uuid, status: AgentStatus) -> Result<(), RepoError>;
    async fn delete(&self, agent_id: Uuid) -> Result<bool, RepoError>;
    async fn list_by_user(&self, user_id: &str, limit: usize, offset: usize) -> Result<Vec<AgentContext>, RepoError>;
    async fn list_by_status(&self, status: AgentStatus, limit: usize, offset: usize) -> Result<Vec<AgentContext>, RepoError>;
}

#[derive(Default)]
struct Indices {
    contexts: HashMap<Uuid, AgentContext>,
    by_user: HashMap<String, Vec<Uuid>>,
    by_status: HashMap<AgentStatus, Vec<Uuid>>,
    by_sandbox: HashMap<String, Uuid>,
}

impl Indices {
    fn index_insert(&mut self, context: &AgentContext) {
        let user_agents = self.by_user.entry(context.user_id.clone()).or_default();
        if !user_agents.contains(&context.agent_id) {
            user_agents.push(context.agent_id);
        }
        let status_agents = self.by_status.entry(context.status).or_default();
        if !status_agents.contains(&context.agent_id) {
            status_agents.push(context.agent_id);
        }
        if let Some(sandbox_id) = &context.sandbox_id {
            self.by_sandbox.insert(sandbox_id.clone(), context.agent_id);
        }
    }

    fn index_remove_status(&mut self, status: AgentStatus, agent_id: Uuid) {
        if let Some(agents) = self.by_status.get_mut(&status) {
            agents.retain(|id| *id != agent_id);
        }
    }

    fn index_remove_sandbox(&mut self, sandbox_id: &str) {
        self.by_sandbox.remove(sandbox_id);
    }

    fn index_remove_all(&mut self, context: &AgentContext) {
        if let Some(agents) = self.by_user.get_mut(&context.user_id) {
            agents.retain(|id| *id != context.agent_id);
        }
        self.index_remove_status(context.status, context.agent_id);
        if let Some(sandbox_id) = &context.sandbox_id {
            self.index_remove_sandbox(sandbox_id);
        }
    }
}

/// In-memory `AgentContextRepository`. A durable backend (e.g. a `sqlx`
/// table with the same indices expressed as SQL columns) would implement
/// the same trait; wiring the concrete choice is left to the binary that
/// assembles the service.
pub struct InMemoryAgentContextRepository {
    inner: Mutex<Indices>,
}

impl InMemoryAgentContextRepository {
    pub fn new() -> Self {
        Self { inner: Mutex::new(Indices::default()) }
    }
}

impl Default for InMemoryAgentContextRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AgentContextRepository for InMemoryAgentContextRepository {
    async fn save(&self, context: AgentContext) -> Result<(), RepoError> {
        let mut guard = self.inner.lock().unwrap();
        guard.index_insert(&context);
        guard.contexts.insert(context.agent_id, context);
        Ok(())
    }

    async fn get(&self, agent_id: Uuid) -> Result<Option<AgentContext>, RepoError> {
        Ok(self.inner.lock().unwrap().contexts.get(&agent_id).cloned())
    }

    async fn update(&self, mut context: AgentContext) -> Result<(), RepoError> {
        let mut guard = self.inner.lock().unwrap();
        let Some(old) = guard.contexts.get(&context.agent_id).cloned() else {
            return Err(RepoError::NotFound(context.agent_id));
        };

        if old.status != context.status {
            guard.index_remove_status(old.status, context.agent_id);
        }
        if old.sandbox_id != context.sandbox_id {
            if let Some(sandbox_id) = &old.sandbox_id {
                guard.index_remove_sandbox(sandbox_id);
            }
        }
        context.updated_at = chrono::Utc::now();
        guard.index_insert(&context);
        guard.contexts.insert(context.agent_id, context);
        Ok(())
    }

    async fn update_status(&self, agent_id: Uuid, status: AgentStatus) -> Result<(), RepoError> {
        let mut guard = self.inner.lock().unwrap();
        let Some(mut context) = guard.contexts.get(&agent_id).cloned() else {
            return Err(RepoError::NotFound(agent_id));
        };
        let old_status = context.status;
        context.set_status(status);
        if old_status != status {
            guard.index_remove_status(old_status, agent_id);
        }
        guard.by_status.entry(status).or_default().push(agent_id);
        guard.contexts.insert(agent_id, context);
        Ok(())
    }

    async fn delete(&self, agent_id: Uuid) -> Result<bool, RepoError> {
        let mut guard = self.inner.lock().unwrap();
        let Some(context) = guard.contexts.remove(&agent_id) else {
            return Ok(false);
        };
        guard.index_remove_all(&context);
        Ok(true)
    }

    async fn list_by_user(&self, user_id: &str, limit: usize, offset: usize) -> Result<Vec<AgentContext>, RepoError> {
        let guard = self.inner.lock().unwrap();
        let ids = guard.by_user.get(user_id).cloned().unwrap_or_default();
        Ok(paginate(&guard.contexts, ids, limit, offset))
    }

    async fn list_by_status(&self, status: AgentStatus, limit: usize, offset: usize) -> Result<Vec<AgentContext>, RepoError> {
        let guard = self.inner.lock().unwrap();
        let ids = guard.by_status.get(&status).cloned().unwrap_or_default();
        Ok(paginate(&guard.contexts, ids, limit, offset))
    }
}

fn paginate(contexts: &HashMap<Uuid, AgentContext>, ids: Vec<Uuid>, limit: usize, offset: usize) -> Vec<AgentContext> {
    let mut result: Vec<AgentContext> = ids.into_iter().filter_map(|id| contexts.get(&id).cloned()).collect();
    result.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
    result.into_iter().skip(offset).take(limit).collect()
}

// ─── Unit tests ──────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(user: &str) -> AgentContext {
        AgentContext::new(Uuid::new_v4(), user, "plan_act")
    }

    #[tokio::test]
    async fn save_and_get_round_trips() {
        let repo = InMemoryAgentContextRepository::new();
        let c = ctx("u1");
        let id = c.agent_id;
        repo.save(c).await.unwrap();
        assert!(repo.get(id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn list_by_user_finds_saved_contexts() {
        let repo = InMemoryAgentContextRepository::new();
        repo.save(ctx("u1")).await.unwrap();
        repo.save(ctx("u2")).await.unwrap();
        let listed = repo.list_by_user("u1", 50, 0).await.unwrap();
        assert_eq!(listed.len(), 1);
    }

    #[tokio::test]
    async fn update_status_rekeys_the_status_index() {
        let repo = InMemoryAgentContextRepository::new();
        let c = ctx("u1");
        let id = c.agent_id;
        repo.save(c).await.unwrap();
        repo.update_status(id, AgentStatus::Running).await.unwrap();

        let created = repo.list_by_status(AgentStatus::Created, 50, 0).await.unwrap();
        let running = repo.list_by_status(AgentStatus::Running, 50, 0).await.unwrap();
        assert!(created.is_empty());
        assert_eq!(running.len(), 1);
    }

    #[tokio::test]
    async fn update_refreshes_updated_at() {
        let repo = InMemoryAgentContextRepository::new();
        let c = ctx("u1");
        let id = c.agent_id;
        let before = c.updated_at;
        repo.save(c).await.unwrap();

        let mut updated = repo.get(id).await.unwrap().unwrap();
        updated.set_sandbox_id("sandbox-1");
        repo.update(updated).await.unwrap();

        let now = repo.get(id).await.unwrap().unwrap();
        assert!(now.updated_at >= before);
        assert_eq!(now.sandbox_id.as_deref(), Some("sandbox-1"));
    }

    #[tokio::test]
    async fn delete_removes_from_every_index() {
        let repo = InMemoryAgentContextRepository::new();
        let c = ctx("u1");
        let id = c.agent_id;
        repo.save(c).await.unwrap();
        assert!(repo.delete(id).await.unwrap());
        assert!(repo.get(id).await.unwrap().is_none());
        assert!(repo.list_by_user("u1", 50, 0).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn update_on_missing_context_is_an_error() {
        let repo = InMemoryAgentContextRepository::new();
        let missing = ctx("u1");
        assert!(repo.update(missing).await.is_err());
    }

    #[tokio::test]
    async fn list_is_paginated_and_sorted_newest_first() {
        let repo = InMemoryAgentContextRepository::new();
        for _ in 0..5 {
            repo.save(ctx("u1")).await.unwrap();
            tokio::time::sleep(std::time::Duration::from_millis(1)).await;
        }
        let page = repo.list_by_user("u1", 2, 0).await.unwrap();
        assert_eq!(page.len(), 2);
        assert!(page[0].created_at >= page[1].created_at);
    }
}
