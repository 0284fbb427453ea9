//! A small query cache over [`ApiClient`].
//!
//! Reads are cached by the built URL and concurrent reads of one URL share a
//! single request. Mutations are never cached; their last state is recorded
//! under the route template.

use dashmap::DashMap;
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::watch;

use crate::client::{decode, ApiClient};
use crate::error::{RequestError, RequestResult};
use crate::input::RequestInput;
use crate::route::ApiRoute;

type Shared = watch::Receiver<Option<RequestResult<Value>>>;

#[derive(Debug)]
enum Entry {
    Ready(Value),
    Pending { id: u64, rx: Shared },
}

/// Last known state of a mutation.
#[derive(Debug, Clone, PartialEq)]
pub enum MutationState {
    /// Never run.
    Idle,
    /// In flight.
    Pending,
    /// Finished with data.
    Success(Value),
    /// Finished with an error.
    Failed(RequestError),
}

/// Cached reads and tracked writes.
#[derive(Debug)]
pub struct QueryClient {
    client: ApiClient,
    entries: DashMap<String, Entry>,
    mutations: DashMap<String, MutationState>,
    next_id: AtomicU64,
}

enum Role {
    Leader { id: u64, tx: watch::Sender<Option<RequestResult<Value>>> },
    Follower(Shared),
}

/// Removes a pending entry if its leader stops before finishing.
struct PendingGuard<'a> {
    entries: &'a DashMap<String, Entry>,
    key: &'a str,
    id: u64,
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        let id = self.id;
        self.entries
            .remove_if(self.key, |_, entry| matches!(entry, Entry::Pending { id: i, .. } if *i == id));
    }
}

impl QueryClient {
    /// Wraps `client`.
    pub fn new(client: ApiClient) -> Self {
        Self {
            client,
            entries: DashMap::new(),
            mutations: DashMap::new(),
            next_id: AtomicU64::new(0),
        }
    }

    /// The underlying client.
    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    /// Cache key for a call: the full built URL.
    ///
    /// # Errors
    ///
    /// Fails like [`ApiClient::build_url`].
    pub fn key_for<R: ApiRoute>(&self, input: &RequestInput<R>) -> RequestResult<String> {
        self.client.build_url(input).map(String::from)
    }

    /// Reads route `R`, from the cache when possible.
    ///
    /// Errors are returned to every waiting caller and are not cached.
    ///
    /// # Errors
    ///
    /// Returns the request's error.
    pub async fn query<R: ApiRoute>(&self, input: RequestInput<R>) -> RequestResult<R::Response> {
        let key = self.key_for(&input)?;

        loop {
            let role = match self.entries.entry(key.clone()) {
                dashmap::mapref::entry::Entry::Occupied(entry) => match entry.get() {
                    Entry::Ready(value) => {
                        tracing::trace!(key = %key, "query cache hit");
                        return decode::<R>(value.clone());
                    }
                    Entry::Pending { rx, .. } => Role::Follower(rx.clone()),
                },
                dashmap::mapref::entry::Entry::Vacant(entry) => {
                    let id = self.next_id.fetch_add(1, Ordering::Relaxed);
                    let (tx, rx) = watch::channel(None);
                    entry.insert(Entry::Pending { id, rx });
                    Role::Leader { id, tx }
                }
            };

            match role {
                Role::Leader { id, tx } => {
                    let guard = PendingGuard {
                        entries: &self.entries,
                        key: &key,
                        id,
                    };
                    let result = self.client.fetch(&input).await;

                    if let Ok(value) = &result {
                        if let Some(mut entry) = self.entries.get_mut(&key) {
                            if matches!(*entry, Entry::Pending { id: i, .. } if i == id) {
                                *entry = Entry::Ready(value.clone());
                            }
                        }
                    }
                    drop(guard);

                    let _ = tx.send(Some(result.clone()));
                    return result.and_then(decode::<R>);
                }
                Role::Follower(mut rx) => {
                    let shared = match rx.wait_for(Option::is_some).await {
                        Ok(shared) => (*shared).clone(),
                        Err(_) => None,
                    };
                    match shared {
                        Some(result) => return result.and_then(decode::<R>),
                        // The leader was dropped; take over.
                        None => continue,
                    }
                }
            }
        }
    }

    /// Runs route `R` as a mutation and records its state under the template.
    ///
    /// # Errors
    ///
    /// Returns the request's error.
    pub async fn mutate<R: ApiRoute>(&self, input: RequestInput<R>) -> RequestResult<R::Response> {
        self.mutations
            .insert(R::TEMPLATE.to_string(), MutationState::Pending);

        let result = self.client.fetch(&input).await;
        let state = match &result {
            Ok(value) => MutationState::Success(value.clone()),
            Err(e) => MutationState::Failed(e.clone()),
        };
        self.mutations.insert(R::TEMPLATE.to_string(), state);

        result.and_then(decode::<R>)
    }

    /// Last state of the mutation on `template`.
    pub fn mutation_state(&self, template: &str) -> MutationState {
        self.mutations
            .get(template)
            .map_or(MutationState::Idle, |state| state.clone())
    }

    /// Cached data for `key`, if any.
    pub fn cached(&self, key: &str) -> Option<Value> {
        match self.entries.get(key)?.value() {
            Entry::Ready(value) => Some(value.clone()),
            Entry::Pending { .. } => None,
        }
    }

    /// Drops the cached data for `key`. Returns true if something was removed.
    pub fn invalidate(&self, key: &str) -> bool {
        self.entries.remove(key).is_some()
    }

    /// Drops every cached entry.
    pub fn invalidate_all(&self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_guard_removes_only_its_own_entry() {
        let entries = DashMap::new();
        let (_tx, rx) = watch::channel(None);
        entries.insert("a".to_string(), Entry::Pending { id: 1, rx });

        drop(PendingGuard {
            entries: &entries,
            key: "a",
            id: 2,
        });
        assert!(entries.contains_key("a"));

        drop(PendingGuard {
            entries: &entries,
            key: "a",
            id: 1,
        });
        assert!(!entries.contains_key("a"));
    }

    #[test]
    fn test_guard_keeps_ready_entry() {
        let entries = DashMap::new();
        entries.insert("a".to_string(), Entry::Ready(json!(1)));
        drop(PendingGuard {
            entries: &entries,
            key: "a",
            id: 0,
        });
        assert!(entries.contains_key("a"));
    }

    #[test]
    fn test_mutation_state_defaults_to_idle() {
        let cache = QueryClient::new(ApiClient::new());
        assert_eq!(cache.mutation_state("/api/items"), MutationState::Idle);
        assert!(!cache.invalidate("missing"));
    }
}
