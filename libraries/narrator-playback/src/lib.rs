//! Narrator Playback - transport, persistence and progress
//!
//! Platform-agnostic control layer over `narrator-audio`:
//! - [`Player`]: façade owning the speaker and the current [`Session`]
//! - [`TransportState`]: NoFile / Loaded / Playing / Paused state machine
//! - [`SessionStore`]: last file, position and play state across launches
//! - [`ProgressSampler`]: 10 Hz position readings for the UI
//!
//! # Example
//!
//! ```rust,no_run
//! use narrator_audio::NullDevice;
//! use narrator_playback::{Intent, Mp3Loader, Player, PlayerView, SessionStore};
//! # use narrator_playback::{Controls, ProgressUpdate};
//! # use std::path::{Path, PathBuf};
//! # use std::sync::Arc;
//! # struct View;
//! # impl PlayerView for View {
//! #     fn show_status(&self, _: &str) {}
//! #     fn show_cover(&self, _: Option<&Path>) {}
//! #     fn set_controls(&self, _: Controls) {}
//! #     fn show_progress(&self, _: &ProgressUpdate) {}
//! #     fn show_error(&self, _: &str) {}
//! # }
//!
//! let store = SessionStore::open(Path::new("/tmp/narrator"));
//! let mut player = Player::new(
//!     Box::new(NullDevice::new()),
//!     Box::new(Mp3Loader),
//!     store,
//!     Arc::new(View),
//! );
//!
//! player.handle(Intent::Open(PathBuf::from("book.mp3")));
//! player.handle(Intent::Play);
//! player.handle(Intent::SpeedUp);
//! player.close();
//! ```

pub mod cover;
pub mod error;
pub mod loader;
pub mod persister;
pub mod player;
pub mod preferences;
pub mod sampler;
pub mod session;
pub mod timefmt;
pub mod transport;
pub mod view;

pub use cover::find_cover_image;
pub use error::{PlaybackError, Result};
pub use loader::{LoadedSource, Mp3Loader, SourceLoader};
pub use persister::{ResumeOffer, SessionRecord, SessionStore};
pub use player::Player;
pub use preferences::Preferences;
pub use sampler::{ProgressSampler, ProgressSink, ProgressUpdate, SAMPLE_PERIOD};
pub use session::Session;
pub use timefmt::{format_hms, parse_hms};
pub use transport::{Controls, Intent, TransportState, SKIP_SECONDS, VOLUME_STEP};
pub use view::{PlayerView, STATUS_IDLE};
