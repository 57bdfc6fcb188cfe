//! A terminal red packet (红包) game: create envelopes, grab random shares, climb the leaderboard.

pub mod amount;
pub mod app;
pub mod config;
pub mod envelope;
pub mod error;
pub mod leaderboard;
pub mod mock;
pub mod screen;
pub mod timer;
pub mod ui;

pub use amount::Amount;
pub use app::App;
pub use config::{Cli, Config};
pub use envelope::{Envelope, EnvelopeId, EnvelopeStore, GrabOutcome, PayoutMode};
pub use error::GameError;
pub use leaderboard::{Leaderboard, LeaderboardEntry};
pub use screen::{Nav, Screen};
