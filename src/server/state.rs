use axum::extract::FromRef;

use crate::analytics::AnalyticsStore;
use crate::music_store::MusicStore;
use crate::user::UserManager;
use std::sync::Arc;
use std::time::Instant;

use super::ServerConfig;

pub type GuardedMusicStore = Arc<dyn MusicStore>;
pub type GuardedAnalyticsStore = Arc<dyn AnalyticsStore>;
pub type GuardedUserManager = Arc<UserManager>;

#[derive(Clone)]
pub struct ServerState {
    pub config: ServerConfig,
    pub start_time: Instant,
    pub music_store: GuardedMusicStore,
    pub analytics_store: GuardedAnalyticsStore,
    pub user_manager: GuardedUserManager,
}

impl FromRef<ServerState> for GuardedMusicStore {
    fn from_ref(input: &ServerState) -> Self {
        input.music_store.clone()
    }
}

impl FromRef<ServerState> for GuardedAnalyticsStore {
    fn from_ref(input: &ServerState) -> Self {
        input.analytics_store.clone()
    }
}

impl FromRef<ServerState> for GuardedUserManager {
    fn from_ref(input: &ServerState) -> Self {
        input.user_manager.clone()
    }
}

impl FromRef<ServerState> for ServerConfig {
    fn from_ref(input: &ServerState) -> Self {
        input.config.clone()
    }
}
