mod client;

pub mod bridge;
pub mod capture;
pub mod config;
pub mod error;
pub mod playback;
pub mod reveal;
pub mod session;
pub mod speech_cache;
pub mod token;
pub mod turn;

pub use client::config::Config as ClientConfig;
pub use client::{connect, connect_with_config, Client, ClientTx, ServerRx};
pub use config::EngineConfig;
pub use error::EngineError;
pub use session::{SessionCommand, SessionSnapshot, VoiceSession};
pub use turn::TurnStatus;

pub use parlance_realtime_types as types;
pub use parlance_realtime_utils as utils;
