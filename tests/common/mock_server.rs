//! Mock API server helpers
//!
//! Starts a `wiremock` server and a session manager pointed at it, with
//! in-memory credential tiers and recording UI seams.

use std::sync::Arc;

use rehab_portal::client::storage::{USER_ID_KEY, USER_TOKEN_KEY};
use rehab_portal::client::{
    ApiClient, Config, CredentialStore, KeyValueStore, MemoryStore, RecordingNavigator,
    RecordingNotifier, SessionManager, SessionStore,
};
use wiremock::MockServer;

/// A session manager wired to a mock API
pub struct TestClient {
    pub server: MockServer,
    pub manager: SessionManager,
    pub notifier: Arc<RecordingNotifier>,
    pub navigator: Arc<RecordingNavigator>,
    pub durable: Arc<MemoryStore>,
    pub volatile: Arc<MemoryStore>,
}

/// A session manager pointed at an address nothing listens on
pub struct OfflineClient {
    pub manager: SessionManager,
    pub notifier: Arc<RecordingNotifier>,
    pub navigator: Arc<RecordingNavigator>,
    pub durable: Arc<MemoryStore>,
    pub volatile: Arc<MemoryStore>,
}

struct Wiring {
    manager: SessionManager,
    notifier: Arc<RecordingNotifier>,
    navigator: Arc<RecordingNavigator>,
    durable: Arc<MemoryStore>,
    volatile: Arc<MemoryStore>,
}

fn wire(uri: String) -> Wiring {
    let config = Config::for_url(uri).expect("mock server URI is valid");
    let api = ApiClient::new(config).expect("client builds");

    let durable = Arc::new(MemoryStore::new());
    let volatile = Arc::new(MemoryStore::new());
    let notifier = Arc::new(RecordingNotifier::new());
    let navigator = Arc::new(RecordingNavigator::new());

    let manager = SessionManager::new(
        api,
        SessionStore::new(),
        CredentialStore::new(durable.clone(), volatile.clone()),
        notifier.clone(),
        navigator.clone(),
    );

    Wiring {
        manager,
        notifier,
        navigator,
        durable,
        volatile,
    }
}

impl OfflineClient {
    /// Starts a mock server, keeps its address and shuts it down
    pub async fn start() -> Self {
        let server = MockServer::start().await;
        let uri = server.uri();
        drop(server);

        let w = wire(uri);
        Self {
            manager: w.manager,
            notifier: w.notifier,
            navigator: w.navigator,
            durable: w.durable,
            volatile: w.volatile,
        }
    }
}

impl TestClient {
    pub async fn start() -> Self {
        let server = MockServer::start().await;
        let w = wire(server.uri());

        Self {
            server,
            manager: w.manager,
            notifier: w.notifier,
            navigator: w.navigator,
            durable: w.durable,
            volatile: w.volatile,
        }
    }

    /// `(userId, userToken)` held by a tier, if any
    pub fn stored(store: &MemoryStore) -> (Option<String>, Option<String>) {
        (store.get(USER_ID_KEY), store.get(USER_TOKEN_KEY))
    }

    pub fn seed(store: &MemoryStore, id: &str, token: &str) {
        store.set(USER_ID_KEY, id).expect("memory store write");
        store.set(USER_TOKEN_KEY, token).expect("memory store write");
    }
}
