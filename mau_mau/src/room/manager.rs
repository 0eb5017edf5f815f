//! Room manager for spawning and managing multiple room actors.

use std::{collections::HashMap, sync::Arc};
use tokio::sync::{RwLock, mpsc, oneshot};

use super::{
    actor::{RoomActor, RoomHandle},
    config::RoomConfig,
    messages::{CloseOutcome, MoveOutcome, RoomEvent, RoomMessage, RoomMetadata, RoomSnapshot},
};
use crate::game::{
    entities::{GameView, Move, PlayerId, RoomId},
    errors::{GameError, GameResult},
};

/// Registry of running rooms.
///
/// Cloning is cheap; clones share the same registry.
#[derive(Clone)]
pub struct RoomManager {
    /// Active room handles
    rooms: Arc<RwLock<HashMap<RoomId, RoomHandle>>>,

    /// Next room ID
    next_room_id: Arc<RwLock<RoomId>>,
}

impl Default for RoomManager {
    fn default() -> Self {
        Self::new()
    }
}

impl RoomManager {
    pub fn new() -> Self {
        Self {
            rooms: Arc::new(RwLock::new(HashMap::new())),
            next_room_id: Arc::new(RwLock::new(1)),
        }
    }

    /// Create and spawn a new room
    pub async fn create_room(
        &self,
        config: RoomConfig,
        created_by: Option<PlayerId>,
    ) -> GameResult<RoomId> {
        config.validate().map_err(GameError::InvalidRoomConfig)?;

        let mut next_id = self.next_room_id.write().await;
        let room_id = *next_id;
        *next_id += 1;
        drop(next_id);

        let (actor, handle) = RoomActor::new(room_id, config, created_by);

        let mut rooms = self.rooms.write().await;
        rooms.insert(room_id, handle);
        drop(rooms);

        tokio::spawn(async move {
            actor.run().await;
        });

        log::info!("Created and spawned room {}", room_id);

        Ok(room_id)
    }

    /// Get a room handle. Handles whose actor has stopped are dropped from
    /// the registry.
    pub async fn get_room(&self, room_id: RoomId) -> GameResult<RoomHandle> {
        let rooms = self.rooms.read().await;
        let handle = rooms.get(&room_id).cloned();
        drop(rooms);

        match handle {
            Some(handle) if !handle.is_closed() => Ok(handle),
            Some(_) => {
                self.rooms.write().await.remove(&room_id);
                Err(GameError::RoomNotFound)
            }
            None => Err(GameError::RoomNotFound),
        }
    }

    /// Send a request to a room and wait for its reply.
    async fn request<T>(
        &self,
        room_id: RoomId,
        build: impl FnOnce(oneshot::Sender<T>) -> RoomMessage,
    ) -> GameResult<T> {
        let handle = self.get_room(room_id).await?;
        let (tx, rx) = oneshot::channel();
        handle.send(build(tx)).await?;
        rx.await.map_err(|_| GameError::RoomClosed)
    }

    /// List all rooms that are not private
    pub async fn list_rooms(&self) -> Vec<RoomMetadata> {
        let room_ids: Vec<RoomId> = self.rooms.read().await.keys().copied().collect();

        let mut metadata_list = Vec::new();
        for room_id in room_ids {
            if let Ok(snapshot) = self.get_room_state(room_id, None).await
                && !snapshot.room.is_private
            {
                metadata_list.push(RoomMetadata::from(&snapshot.room));
            }
        }
        metadata_list.sort_by_key(|m| m.id);
        metadata_list
    }

    pub async fn join_room(
        &self,
        room_id: RoomId,
        player_id: PlayerId,
        name: String,
    ) -> GameResult<RoomSnapshot> {
        self.request(room_id, |response| RoomMessage::Join {
            player_id,
            name,
            response,
        })
        .await?
    }

    pub async fn add_bot(&self, room_id: RoomId) -> GameResult<PlayerId> {
        self.request(room_id, |response| RoomMessage::AddBot { response })
            .await?
    }

    pub async fn leave_room(&self, room_id: RoomId, player_id: PlayerId) -> GameResult<()> {
        self.request(room_id, |response| RoomMessage::Leave {
            player_id,
            response,
        })
        .await?
    }

    pub async fn set_ready(
        &self,
        room_id: RoomId,
        player_id: PlayerId,
        ready: bool,
    ) -> GameResult<RoomSnapshot> {
        self.request(room_id, |response| RoomMessage::SetReady {
            player_id,
            ready,
            response,
        })
        .await?
    }

    pub async fn start_match(&self, room_id: RoomId) -> GameResult<GameView> {
        self.request(room_id, |response| RoomMessage::StartMatch { response })
            .await?
    }

    pub async fn submit_move(
        &self,
        room_id: RoomId,
        player_id: PlayerId,
        mv: Move,
    ) -> GameResult<MoveOutcome> {
        self.request(room_id, |response| RoomMessage::SubmitMove {
            player_id,
            mv,
            response,
        })
        .await?
    }

    pub async fn notify_disconnect(&self, room_id: RoomId, player_id: PlayerId) -> GameResult<()> {
        self.request(room_id, |response| RoomMessage::Disconnect {
            player_id,
            response,
        })
        .await?
    }

    pub async fn notify_reconnect(
        &self,
        room_id: RoomId,
        player_id: PlayerId,
    ) -> GameResult<RoomSnapshot> {
        self.request(room_id, |response| RoomMessage::Reconnect {
            player_id,
            response,
        })
        .await?
    }

    /// Get room state, personalized for `viewer` if given
    pub async fn get_room_state(
        &self,
        room_id: RoomId,
        viewer: Option<PlayerId>,
    ) -> GameResult<RoomSnapshot> {
        self.request(room_id, |response| RoomMessage::GetState { viewer, response })
            .await
    }

    /// Subscribe to a room's events. Returns the receiving end.
    pub async fn subscribe(
        &self,
        room_id: RoomId,
        subscriber_id: String,
        buffer: usize,
    ) -> GameResult<mpsc::Receiver<RoomEvent>> {
        let handle = self.get_room(room_id).await?;
        let (sender, receiver) = mpsc::channel(buffer);
        handle
            .send(RoomMessage::Subscribe {
                subscriber_id,
                sender,
            })
            .await?;
        Ok(receiver)
    }

    pub async fn unsubscribe(&self, room_id: RoomId, subscriber_id: String) -> GameResult<()> {
        let handle = self.get_room(room_id).await?;
        handle
            .send(RoomMessage::Unsubscribe { subscriber_id })
            .await
    }

    /// Delete a room. Deletion is deferred while a round transition is
    /// running unless `force` is set; the room closes on its own once the
    /// transition completes.
    pub async fn delete_room(&self, room_id: RoomId, force: bool) -> GameResult<CloseOutcome> {
        let outcome = self
            .request(room_id, |response| RoomMessage::Close { force, response })
            .await?;

        if outcome == CloseOutcome::Closed {
            self.rooms.write().await.remove(&room_id);
            log::info!("Deleted room {}", room_id);
        } else {
            log::info!("Deletion of room {} deferred", room_id);
        }

        Ok(outcome)
    }

    /// Get active room count
    pub async fn active_room_count(&self) -> usize {
        let rooms = self.rooms.read().await;
        rooms.values().filter(|h| !h.is_closed()).count()
    }

    /// Close every room immediately.
    pub async fn shutdown(&self) {
        let handles: Vec<RoomHandle> = self.rooms.write().await.drain().map(|(_, h)| h).collect();
        log::info!("Shutting down {} rooms", handles.len());

        for handle in handles {
            let (tx, rx) = oneshot::channel();
            if handle
                .send(RoomMessage::Close {
                    force: true,
                    response: tx,
                })
                .await
                .is_ok()
            {
                let _ = rx.await;
            }
        }
    }
}
