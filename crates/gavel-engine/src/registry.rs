//! Process-wide room store.
//!
//! Inserts and removals serialize on the map's write lock; lookups share
//! the read lock and only clone an `Arc`, so they never wait on a room's
//! own mutex. A room is fully built before it is inserted, so a lookup can
//! never observe a half-constructed room.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use gavel_types::{
    Bidder, BidderId, EngineConfig, GavelError, Lot, Result, RoomCode, RoomSettings, constants,
};
use rand::RngCore;
use tokio::sync::RwLock;

use crate::room::RoomHandle;

/// Maps room codes to live rooms.
#[derive(Debug)]
pub struct RoomRegistry {
    rooms: RwLock<HashMap<RoomCode, Arc<RoomHandle>>>,
    config: EngineConfig,
}

impl RoomRegistry {
    #[must_use]
    pub fn new(config: EngineConfig) -> Self {
        Self {
            rooms: RwLock::new(HashMap::new()),
            config,
        }
    }

    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Create a room with `owner` as its only bidder.
    ///
    /// `settings` defaults to the engine's default settings.
    ///
    /// # Errors
    /// `InvalidSettings` / `InvalidLot` for bad input (including two lots
    /// sharing an id), `RegistryExhausted`
    /// when the room ceiling is hit or no free code could be minted.
    pub async fn create(
        &self,
        owner: BidderId,
        team_name: Option<String>,
        settings: Option<RoomSettings>,
        lots: Vec<Lot>,
    ) -> Result<Arc<RoomHandle>> {
        let settings = settings.unwrap_or_else(|| self.config.default_settings.clone());
        settings.validate()?;
        let mut seen = HashSet::with_capacity(lots.len());
        for lot in &lots {
            lot.validate()?;
            if !seen.insert(&lot.id) {
                return Err(GavelError::InvalidLot {
                    reason: format!("duplicate lot id {} ({})", lot.id, lot.name),
                });
            }
        }
        let name = team_name.unwrap_or_else(|| owner.to_string());
        let bidder = Bidder::new(owner.clone(), name, settings.starting_purse);
        let catalog = lots.into_iter().map(Arc::new).collect();

        let mut rooms = self.rooms.write().await;
        if rooms.len() >= self.config.max_rooms {
            return Err(GavelError::RegistryExhausted {
                reason: format!("{} rooms already open", rooms.len()),
            });
        }
        let code = (0..constants::ROOM_CODE_ATTEMPTS)
            .map(|_| mint_code(self.config.room_code_len))
            .find(|code| !rooms.contains_key(code))
            .ok_or_else(|| GavelError::RegistryExhausted {
                reason: format!(
                    "no free room code after {} attempts",
                    constants::ROOM_CODE_ATTEMPTS
                ),
            })?;

        let handle = RoomHandle::new(code.clone(), bidder, settings, catalog, &self.config);
        rooms.insert(code.clone(), Arc::clone(&handle));
        tracing::info!(room = %code, owner = %owner, open_rooms = rooms.len(), "Room created");
        Ok(handle)
    }

    /// # Errors
    /// `RoomNotFound` for an unknown code.
    pub async fn get(&self, code: &RoomCode) -> Result<Arc<RoomHandle>> {
        self.rooms
            .read()
            .await
            .get(code)
            .cloned()
            .ok_or_else(|| GavelError::RoomNotFound(code.clone()))
    }

    /// Drop a room, disarming anything it has scheduled.
    ///
    /// # Errors
    /// `RoomNotFound` for an unknown code.
    pub async fn remove(&self, code: &RoomCode) -> Result<()> {
        let removed = self.rooms.write().await.remove(code);
        let handle = removed.ok_or_else(|| GavelError::RoomNotFound(code.clone()))?;
        handle.shutdown().await;
        tracing::info!(room = %code, "Room removed");
        Ok(())
    }

    pub async fn len(&self) -> usize {
        self.rooms.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.rooms.read().await.is_empty()
    }

    pub async fn codes(&self) -> Vec<RoomCode> {
        let mut codes: Vec<_> = self.rooms.read().await.keys().cloned().collect();
        codes.sort();
        codes
    }
}

/// Random uppercase hex code of `len` characters.
fn mint_code(len: usize) -> RoomCode {
    let mut bytes = vec![0u8; len.div_ceil(2)];
    rand::thread_rng().fill_bytes(&mut bytes);
    let mut code = hex::encode_upper(bytes);
    code.truncate(len);
    RoomCode::new(code)
}
