//! Platform wire types
//!
//! Serde mirrors of the JSON the platform sends on the game stream and its REST
//! endpoints. Only the fields the bot reads are modelled; everything else is
//! ignored on deserialization.

use serde::{Deserialize, Serialize};

/// One unit of the per-game NDJSON stream
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum StreamEvent {
    /// Full snapshot, always the first unit of a (re)opened stream
    GameFull(GameFull),
    /// Incremental state delta
    GameState(GameStateEvent),
    ChatLine(ChatLine),
    OpponentGone(OpponentGone),
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameFull {
    pub id: String,
    #[serde(default)]
    pub variant: VariantInfo,
    #[serde(default)]
    pub clock: Option<ClockInfo>,
    #[serde(default)]
    pub speed: String,
    #[serde(default)]
    pub rated: bool,
    pub white: Player,
    pub black: Player,
    #[serde(default)]
    pub initial_fen: Option<String>,
    pub state: GameStateEvent,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariantInfo {
    pub key: String,
    #[serde(default)]
    pub name: String,
}

impl Default for VariantInfo {
    fn default() -> Self {
        Self {
            key: "standard".to_string(),
            name: "Standard".to_string(),
        }
    }
}

/// Clock settings in milliseconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClockInfo {
    pub initial: u64,
    pub increment: u64,
}

/// A side of the game: a user or the platform AI
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub rating: Option<u32>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub ai_level: Option<u8>,
}

impl Player {
    pub fn display_name(&self) -> String {
        match (&self.name, self.ai_level) {
            (Some(name), _) => match &self.title {
                Some(title) => format!("{title} {name}"),
                None => name.clone(),
            },
            (None, Some(level)) => format!("AI level {level}"),
            (None, None) => "Anonymous".to_string(),
        }
    }
}

/// Game state delta; times are milliseconds
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GameStateEvent {
    /// Space-separated UCI moves since the initial position
    #[serde(default)]
    pub moves: String,
    #[serde(default)]
    pub wtime: u64,
    #[serde(default)]
    pub btime: u64,
    #[serde(default)]
    pub winc: u64,
    #[serde(default)]
    pub binc: u64,
    pub status: String,
    #[serde(default)]
    pub winner: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatLine {
    pub username: String,
    pub text: String,
    pub room: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpponentGone {
    pub gone: bool,
    #[serde(default)]
    pub claim_win_in_seconds: Option<u64>,
}

/// Authenticated account, from `api/account`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub id: String,
    pub username: String,
    #[serde(default)]
    pub title: Option<String>,
}

/// Entry of `api/account/playing`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OngoingGame {
    pub game_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OngoingGames {
    #[serde(default)]
    pub now_playing: Vec<OngoingGame>,
}

/// Event posted to the challenge endpoint: `{"type": "challenge", "challenge": {...}}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChallengeEvent {
    pub challenge: ChallengeInfo,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChallengeInfo {
    pub id: String,
    #[serde(default)]
    pub challenger: Option<Player>,
    #[serde(default)]
    pub variant: VariantInfo,
    #[serde(default)]
    pub rated: bool,
    #[serde(default)]
    pub speed: String,
    #[serde(default)]
    pub time_control: TimeControl,
}

/// Challenge time control; limit and increment are seconds
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TimeControl {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub limit: Option<u64>,
    #[serde(default)]
    pub increment: Option<u64>,
    #[serde(rename = "daysPerTurn", default)]
    pub days_per_turn: Option<u64>,
}
