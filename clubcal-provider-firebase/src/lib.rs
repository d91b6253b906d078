//! Firebase backend for clubcal.
//!
//! Talks to the identity toolkit, Firestore and Cloud Storage REST APIs.
//! All three adapters share one [`FirebaseClient`] so the signed-in user's
//! token is used for every document and blob request.

pub mod auth;
pub mod client;
pub mod document;
pub mod firestore;
pub mod storage;

use std::sync::Arc;

use clubcal_core::{BackendConfig, ClubCalConfig, ClubCalResult, Planner};

pub use auth::FirebaseAuth;
pub use client::{Endpoints, FirebaseClient};
pub use firestore::FirestoreStore;
pub use storage::FirebaseStorage;

/// The identity, document and blob adapters for one project.
#[derive(Clone)]
pub struct FirebaseBackend {
    pub auth: FirebaseAuth,
    pub store: FirestoreStore,
    pub storage: FirebaseStorage,
}

impl FirebaseBackend {
    pub fn new(config: &BackendConfig) -> ClubCalResult<Self> {
        Ok(Self::from_client(FirebaseClient::new(config)?))
    }

    /// Same as [`FirebaseBackend::new`] but against other endpoints, e.g. the emulator.
    pub fn with_endpoints(config: &BackendConfig, endpoints: Endpoints) -> ClubCalResult<Self> {
        Ok(Self::from_client(
            FirebaseClient::new(config)?.with_endpoints(endpoints),
        ))
    }

    fn from_client(client: FirebaseClient) -> Self {
        FirebaseBackend {
            auth: FirebaseAuth::new(client.clone()),
            store: FirestoreStore::new(client.clone()),
            storage: FirebaseStorage::new(client),
        }
    }

    /// A planner wired to this backend with the configured policies.
    pub fn planner(&self, config: &ClubCalConfig) -> Planner {
        let store = Arc::new(self.store.clone());
        Planner::new(store.clone(), store, Arc::new(self.storage.clone())).with_config(config)
    }
}
