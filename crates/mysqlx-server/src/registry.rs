use metrics::gauge;
use mysqlx_core::error::XError;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use tokio::sync::Notify;
use tracing::{debug, info};

/// Shared view of one live connection.
#[derive(Debug)]
pub struct ConnectionHandle {
    pub id: u32,
    pub peer_host: Option<String>,
    user: RwLock<Option<String>>,
    killed: AtomicBool,
    notify: Notify,
}

impl ConnectionHandle {
    pub fn new(id: u32, peer_host: Option<String>) -> Self {
        Self {
            id,
            peer_host,
            user: RwLock::new(None),
            killed: AtomicBool::new(false),
            notify: Notify::new(),
        }
    }

    pub fn set_user(&self, user: &str) {
        *self.user.write().unwrap_or_else(PoisonError::into_inner) = Some(user.to_string());
    }

    pub fn clear_user(&self) {
        *self.user.write().unwrap_or_else(PoisonError::into_inner) = None;
    }

    pub fn user(&self) -> Option<String> {
        self.user
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn is_killed(&self) -> bool {
        self.killed.load(Ordering::Acquire)
    }

    /// Marks the connection for termination. Cancelling only the running
    /// query is accepted and ignored.
    pub fn cancel(&self, query: bool) {
        if query {
            return;
        }
        self.killed.store(true, Ordering::Release);
        self.notify.notify_one();
    }

    /// Resolves once [`ConnectionHandle::cancel`] has marked the connection.
    pub async fn wait_killed(&self) {
        while !self.is_killed() {
            self.notify.notified().await;
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientInfo {
    pub id: u32,
    pub user: String,
    pub host: String,
    pub sql_session: u64,
}

#[derive(Debug)]
pub struct ConnectionRegistry {
    clients: RwLock<HashMap<u32, Arc<ConnectionHandle>>>,
    next_id: AtomicU32,
}

impl Default for ConnectionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self {
            clients: RwLock::new(HashMap::new()),
            next_id: AtomicU32::new(1),
        }
    }

    /// Registers a new connection unless `limit` clients are already
    /// registered. The check and the insert happen under one write lock, so
    /// concurrent admissions cannot overshoot the limit. The connection is
    /// removed again when the returned guard drops.
    pub fn admit(
        self: &Arc<Self>,
        peer_host: Option<String>,
        limit: usize,
    ) -> Option<RegistrationGuard> {
        let (handle, active) = {
            let mut clients = self.clients.write().unwrap_or_else(PoisonError::into_inner);
            if clients.len() >= limit {
                return None;
            }
            let id = self.next_id.fetch_add(1, Ordering::Relaxed);
            let handle = Arc::new(ConnectionHandle::new(id, peer_host));
            clients.insert(id, Arc::clone(&handle));
            (handle, clients.len())
        };
        gauge!("mysqlx_connections_active").set(active as f64);
        debug!(client_id = handle.id, active, "client registered");
        Some(RegistrationGuard {
            registry: Arc::clone(self),
            handle,
        })
    }

    fn deregister(&self, id: u32) {
        let active = {
            let mut clients = self.clients.write().unwrap_or_else(PoisonError::into_inner);
            clients.remove(&id);
            clients.len()
        };
        gauge!("mysqlx_connections_active").set(active as f64);
        debug!(client_id = id, active, "client deregistered");
    }

    pub fn get(&self, id: u32) -> Option<Arc<ConnectionHandle>> {
        self.clients
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&id)
            .cloned()
    }

    pub fn kill(&self, id: u64, query: bool) -> Result<(), XError> {
        let handle = u32::try_from(id)
            .ok()
            .and_then(|id| self.get(id))
            .ok_or(XError::NoSuchThread(id))?;
        info!(client_id = id, query, "kill requested");
        handle.cancel(query);
        Ok(())
    }

    /// Snapshot of the registered clients ordered by id.
    pub fn list(&self) -> Vec<ClientInfo> {
        let clients = self.clients.read().unwrap_or_else(PoisonError::into_inner);
        let mut out: Vec<ClientInfo> = clients
            .values()
            .map(|handle| ClientInfo {
                id: handle.id,
                user: handle.user().unwrap_or_default(),
                host: handle.peer_host.clone().unwrap_or_default(),
                sql_session: u64::from(handle.id),
            })
            .collect();
        out.sort_by_key(|c| c.id);
        out
    }

    pub fn len(&self) -> usize {
        self.clients
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

#[derive(Debug)]
pub struct RegistrationGuard {
    registry: Arc<ConnectionRegistry>,
    handle: Arc<ConnectionHandle>,
}

impl RegistrationGuard {
    pub fn handle(&self) -> &Arc<ConnectionHandle> {
        &self.handle
    }
}

impl Drop for RegistrationGuard {
    fn drop(&mut self) {
        self.registry.deregister(self.handle.id);
    }
}
