//! Game room management.

use queens_core::{GameAction, GameState, ThreadRandomness};
use std::collections::HashMap;
use thiserror::Error;
use uuid::Uuid;

use crate::protocol::{PlayerInfo, RoomInfo, RoomStatus, SpectatorInfo};

#[derive(Debug, Error)]
pub enum RoomError {
    #[error("Room is full")]
    RoomFull,

    #[error("Player not in room")]
    PlayerNotInRoom,

    #[error("Players cannot spectate their own game")]
    AlreadyPlaying,

    #[error("Not the host")]
    NotHost,

    #[error("Game already started")]
    GameAlreadyStarted,

    #[error("Not enough players")]
    NotEnoughPlayers,

    #[error("Game not started")]
    GameNotStarted,

    #[error("Invalid action: {0}")]
    InvalidAction(String),
}

/// A player in a game room.
#[derive(Debug, Clone)]
pub struct RoomPlayer {
    pub id: Uuid,
    pub name: String,
    pub ready: bool,
    pub connected: bool,
    /// Seat in the game (0-3), assigned when the game starts
    pub game_index: Option<u8>,
}

impl RoomPlayer {
    pub fn new(id: Uuid, name: String) -> Self {
        Self {
            id,
            name,
            ready: false,
            connected: true,
            game_index: None,
        }
    }

    pub fn to_info(&self) -> PlayerInfo {
        PlayerInfo {
            id: self.id,
            name: self.name.clone(),
            ready: self.ready,
            connected: self.connected,
        }
    }
}

/// A game room that can hold multiple players and any number of spectators.
pub struct GameRoom {
    pub id: Uuid,
    pub name: String,
    pub max_players: u8,
    pub host_id: Uuid,
    pub status: RoomStatus,
    pub players: HashMap<Uuid, RoomPlayer>,
    pub spectators: HashMap<Uuid, String>,
    /// Order of players for turn taking
    pub player_order: Vec<Uuid>,
    /// The game state (once started)
    pub game: Option<GameState>,
}

impl GameRoom {
    pub fn new(id: Uuid, host_id: Uuid, host_name: String, max_players: u8) -> Self {
        let mut players = HashMap::new();
        players.insert(host_id, RoomPlayer::new(host_id, host_name.clone()));

        Self {
            id,
            name: format!("{}'s Game", host_name),
            max_players: max_players.clamp(2, 4),
            host_id,
            status: RoomStatus::Waiting,
            players,
            spectators: HashMap::new(),
            player_order: vec![host_id],
            game: None,
        }
    }

    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    pub fn is_full(&self) -> bool {
        self.players.len() >= self.max_players as usize
    }

    /// Everyone who should receive room broadcasts.
    pub fn audience(&self) -> Vec<Uuid> {
        self.players
            .keys()
            .chain(self.spectators.keys())
            .copied()
            .collect()
    }

    pub fn add_player(&mut self, player_id: Uuid, name: String) -> Result<(), RoomError> {
        if self.status != RoomStatus::Waiting {
            return Err(RoomError::GameAlreadyStarted);
        }
        if self.is_full() {
            return Err(RoomError::RoomFull);
        }

        self.players
            .insert(player_id, RoomPlayer::new(player_id, name));
        self.player_order.push(player_id);
        Ok(())
    }

    pub fn remove_player(&mut self, player_id: Uuid) -> Result<bool, RoomError> {
        if !self.players.contains_key(&player_id) {
            return Err(RoomError::PlayerNotInRoom);
        }

        self.players.remove(&player_id);
        self.player_order.retain(|&id| id != player_id);

        // If host left, assign new host
        if player_id == self.host_id && !self.player_order.is_empty() {
            self.host_id = self.player_order[0];
        }

        // Return true if room is now empty
        Ok(self.players.is_empty())
    }

    pub fn add_spectator(&mut self, spectator_id: Uuid, name: String) -> Result<(), RoomError> {
        if self.players.contains_key(&spectator_id) {
            return Err(RoomError::AlreadyPlaying);
        }
        self.spectators.insert(spectator_id, name);
        Ok(())
    }

    /// Remove a spectator, returning whether they were one.
    pub fn remove_spectator(&mut self, spectator_id: Uuid) -> bool {
        self.spectators.remove(&spectator_id).is_some()
    }

    pub fn set_player_connected(&mut self, player_id: Uuid, connected: bool) {
        if let Some(player) = self.players.get_mut(&player_id) {
            player.connected = connected;
        }
    }

    /// Host starts the game before the room fills up.
    pub fn start_game(&mut self, requester_id: Uuid) -> Result<(), RoomError> {
        if requester_id != self.host_id {
            return Err(RoomError::NotHost);
        }
        if self.status != RoomStatus::Waiting {
            return Err(RoomError::GameAlreadyStarted);
        }
        if self.players.len() < 2 {
            return Err(RoomError::NotEnoughPlayers);
        }

        self.begin();
        Ok(())
    }

    /// A room at capacity starts on its own. Returns whether it just did.
    pub fn start_if_full(&mut self) -> bool {
        if self.status == RoomStatus::Waiting && self.is_full() {
            self.begin();
            true
        } else {
            false
        }
    }

    fn begin(&mut self) {
        // Assign seats in join order
        for (idx, &player_id) in self.player_order.iter().enumerate() {
            if let Some(player) = self.players.get_mut(&player_id) {
                player.game_index = Some(idx as u8);
            }
        }

        let player_names: Vec<String> = self
            .player_order
            .iter()
            .filter_map(|id| self.players.get(id).map(|p| p.name.clone()))
            .collect();

        let mut rng = ThreadRandomness;
        self.game = Some(GameState::new(player_names, &mut rng));
        self.status = RoomStatus::InGame;
    }

    /// Apply a game action for a player.
    ///
    /// The caller holds this room's exclusive map guard, which is what keeps
    /// actions against one game strictly one-at-a-time: the engine's
    /// snapshot-in, snapshot-out contract depends on it.
    pub fn apply_action(
        &mut self,
        player_id: Uuid,
        action: serde_json::Value,
    ) -> Result<(), RoomError> {
        let game = self.game.as_ref().ok_or(RoomError::GameNotStarted)?;

        let player = self
            .players
            .get(&player_id)
            .ok_or(RoomError::PlayerNotInRoom)?;
        let game_index = player.game_index.ok_or(RoomError::PlayerNotInRoom)?;

        let action: GameAction = serde_json::from_value(action)
            .map_err(|e| RoomError::InvalidAction(e.to_string()))?;

        // Whose turn it is - defense window included - is the engine's rule,
        // so no turn pre-check here
        let mut rng = ThreadRandomness;
        let next = game
            .apply(game_index, &action, &mut rng)
            .map_err(|e| RoomError::InvalidAction(e.to_string()))?;

        if next.is_finished() {
            self.status = RoomStatus::Finished;
        }
        self.game = Some(next);
        Ok(())
    }

    pub fn get_game_state(&self) -> Option<serde_json::Value> {
        self.game.as_ref().map(|g| serde_json::to_value(g).unwrap())
    }

    /// The seat expected to act next: the defender during an interrupt,
    /// otherwise the player whose turn it is.
    pub fn get_acting_player(&self) -> Option<usize> {
        let game = self.game.as_ref()?;
        Some(match game.pending_interrupt() {
            Some(window) => window.defender as usize,
            None => game.current_player() as usize,
        })
    }

    pub fn get_valid_actions(&self) -> Option<Vec<serde_json::Value>> {
        let game = self.game.as_ref()?;
        let actor = self.get_acting_player()? as u8;
        Some(
            game.valid_actions(actor)
                .iter()
                .map(|a| serde_json::to_value(a).unwrap())
                .collect(),
        )
    }

    pub fn get_winner(&self) -> Option<(usize, String)> {
        let game = self.game.as_ref()?;
        let winner_idx = game.winner()? as usize;
        let winner_id = self.player_order.get(winner_idx)?;
        let winner_name = self.players.get(winner_id)?.name.clone();
        Some((winner_idx, winner_name))
    }

    /// Display name for anyone in the room, player or spectator.
    pub fn display_name(&self, id: Uuid) -> Option<String> {
        self.players
            .get(&id)
            .map(|p| p.name.clone())
            .or_else(|| self.spectators.get(&id).cloned())
    }

    pub fn to_info(&self) -> RoomInfo {
        RoomInfo {
            id: self.id,
            name: self.name.clone(),
            players: self
                .player_order
                .iter()
                .filter_map(|id| self.players.get(id).map(|p| p.to_info()))
                .collect(),
            spectators: self
                .spectators
                .iter()
                .map(|(&id, name)| SpectatorInfo {
                    id,
                    name: name.clone(),
                })
                .collect(),
            max_players: self.max_players,
            host_id: self.host_id,
            status: self.status,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_room() {
        let host_id = Uuid::new_v4();
        let room = GameRoom::new(Uuid::new_v4(), host_id, "Host".to_string(), 4);

        assert_eq!(room.player_count(), 1);
        assert!(!room.is_full());
        assert_eq!(room.host_id, host_id);
        assert_eq!(room.status, RoomStatus::Waiting);
    }

    #[test]
    fn test_add_remove_players() {
        let host_id = Uuid::new_v4();
        let mut room = GameRoom::new(Uuid::new_v4(), host_id, "Host".to_string(), 2);

        let player2 = Uuid::new_v4();
        room.add_player(player2, "Player 2".to_string()).unwrap();

        assert_eq!(room.player_count(), 2);
        assert!(room.is_full());

        // Can't add more players
        let player3 = Uuid::new_v4();
        assert!(room.add_player(player3, "Player 3".to_string()).is_err());

        // Remove a player
        let empty = room.remove_player(player2).unwrap();
        assert!(!empty);
        assert_eq!(room.player_count(), 1);
    }

    #[test]
    fn test_host_start_game() {
        let host_id = Uuid::new_v4();
        let mut room = GameRoom::new(Uuid::new_v4(), host_id, "Host".to_string(), 4);

        // Can't start with only 1 player
        assert!(room.start_game(host_id).is_err());

        // Add another player
        let player2 = Uuid::new_v4();
        room.add_player(player2, "Player 2".to_string()).unwrap();

        // Non-host can't start
        assert!(room.start_game(player2).is_err());

        // Host can start
        room.start_game(host_id).unwrap();
        assert_eq!(room.status, RoomStatus::InGame);
        assert!(room.game.is_some());

        // Seats follow join order
        assert_eq!(room.players[&host_id].game_index, Some(0));
        assert_eq!(room.players[&player2].game_index, Some(1));
    }

    #[test]
    fn test_auto_start_when_full() {
        let host_id = Uuid::new_v4();
        let mut room = GameRoom::new(Uuid::new_v4(), host_id, "Host".to_string(), 2);

        assert!(!room.start_if_full());

        let player2 = Uuid::new_v4();
        room.add_player(player2, "Player 2".to_string()).unwrap();

        assert!(room.start_if_full());
        assert_eq!(room.status, RoomStatus::InGame);
        // Only starts once
        assert!(!room.start_if_full());
    }

    #[test]
    fn test_spectators() {
        let host_id = Uuid::new_v4();
        let mut room = GameRoom::new(Uuid::new_v4(), host_id, "Host".to_string(), 2);

        // Players can't double as spectators
        assert!(room.add_spectator(host_id, "Host".to_string()).is_err());

        let watcher = Uuid::new_v4();
        room.add_spectator(watcher, "Watcher".to_string()).unwrap();
        assert!(room.audience().contains(&watcher));
        assert_eq!(room.to_info().spectators.len(), 1);

        assert!(room.remove_spectator(watcher));
        assert!(!room.remove_spectator(watcher));
    }

    #[test]
    fn test_apply_action_through_engine() {
        let host_id = Uuid::new_v4();
        let mut room = GameRoom::new(Uuid::new_v4(), host_id, "Host".to_string(), 2);
        let player2 = Uuid::new_v4();
        room.add_player(player2, "Player 2".to_string()).unwrap();

        // Not started yet
        assert!(matches!(
            room.apply_action(host_id, serde_json::json!({"kind": "declineDefense"})),
            Err(RoomError::GameNotStarted)
        ));

        room.start_game(host_id).unwrap();

        // Garbage payloads are rejected before reaching the engine
        assert!(matches!(
            room.apply_action(host_id, serde_json::json!({"kind": "castFireball"})),
            Err(RoomError::InvalidAction(_))
        ));

        // Drive one real action through the engine via its own enumeration
        let acting = room.get_acting_player().unwrap();
        let actor_uuid = *room
            .player_order
            .get(acting)
            .expect("acting seat maps to a player");
        let actions = room.get_valid_actions().unwrap();
        if let Some(action) = actions.into_iter().next() {
            let turn_before = room.game.as_ref().unwrap().turn_number;
            room.apply_action(actor_uuid, action).unwrap();
            assert!(room.game.as_ref().unwrap().turn_number > turn_before);
        }
    }
}
