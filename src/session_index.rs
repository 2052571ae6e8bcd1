use serde_json::Value;

use crate::{client::KeyValueClient, error::SessionResult, SessionRecord, SessionStore};

/// User session index operations. Every query reconciles the index with the
/// stored sessions: IDs whose session is missing, unreadable, or no longer
/// authenticated are removed from the index.
impl<C> SessionStore<C>
where
    C: KeyValueClient,
{
    /// Get all active sessions of a user, with the (unprefixed) session ID
    /// attached to each record as its `sid` field.
    pub async fn all_user_sessions(&self, user_id: &str) -> SessionResult<Vec<SessionRecord>> {
        let sessions = self
            .reconcile_user_sessions(user_id)
            .await?
            .into_iter()
            .map(|(sid, mut session)| {
                let sid = self.drop_prefix(&sid).to_owned();
                session.insert("sid".to_owned(), Value::String(sid));
                session
            })
            .collect();
        Ok(sessions)
    }

    /// Get the (unprefixed) IDs of all active sessions of a user.
    pub async fn user_session_ids(&self, user_id: &str) -> SessionResult<Vec<String>> {
        let session_ids = self
            .reconcile_user_sessions(user_id)
            .await?
            .into_iter()
            .map(|(sid, _)| self.drop_prefix(&sid).to_owned())
            .collect();
        Ok(session_ids)
    }

    /// Destroy all tracked sessions of a user, optionally keeping one session
    /// (by its stored ID). Returns the number of sessions destroyed.
    pub async fn destroy_user_sessions(
        &self,
        user_id: &str,
        excluded_sid: Option<&str>,
    ) -> SessionResult<u64> {
        let index_key = self.user_sessions_key(user_id);
        let mut session_ids = self.client.set_members(&index_key).await?;
        if let Some(excluded_sid) = excluded_sid {
            session_ids.retain(|sid| sid != excluded_sid);
        }
        if session_ids.is_empty() {
            return Ok(0);
        }

        tracing::debug!("DEL {} sessions of user {user_id}", session_ids.len());
        let deleted = self.client.delete(&session_ids).await?;
        self.client.set_remove(&index_key, &session_ids).await?;
        Ok(deleted)
    }

    /// Fetch the user's indexed sessions in a single batch, and prune the IDs
    /// that don't point to an authenticated session anymore.
    async fn reconcile_user_sessions(
        &self,
        user_id: &str,
    ) -> SessionResult<Vec<(String, SessionRecord)>> {
        let index_key = self.user_sessions_key(user_id);
        let session_ids = self.client.set_members(&index_key).await?;
        if session_ids.is_empty() {
            return Ok(Vec::new());
        }
        let raw_values = self.client.batch_get(&session_ids).await?;

        let (active, stale): (Vec<_>, Vec<_>) = session_ids
            .into_iter()
            .zip(raw_values)
            .map(|(sid, raw)| {
                let session = raw
                    .and_then(|raw| SessionRecord::parse(&raw).ok())
                    .filter(|session| session.user_id().is_some());
                (sid, session)
            })
            .partition(|(_, session)| session.is_some());

        if !stale.is_empty() {
            let stale_ids: Vec<_> = stale.into_iter().map(|(sid, _)| sid).collect();
            tracing::debug!("SREM {index_key} {}", stale_ids.join(" "));
            if let Err(e) = self.client.set_remove(&index_key, &stale_ids).await {
                tracing::warn!("Failed to prune stale sessions from {index_key}: {e}");
            }
        }

        let sessions = active
            .into_iter()
            .filter_map(|(sid, session)| Some((sid, session?)))
            .collect();
        Ok(sessions)
    }
}
