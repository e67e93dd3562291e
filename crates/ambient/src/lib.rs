//! Ambient audio for Event Horizon.
//!
//! Playback may only start after a qualifying user gesture, mirroring the
//! autoplay rules the scene was first written against. [`AudioSession`] owns
//! that state machine:
//!
//! ```text
//!   Locked ──pointer press──▶ Unlocked ◀──visible── Suspended
//!     ▲                          │ ──hidden──────────▶ │
//!     └──────── dispose ─────────┴─────────────────────┘
//! ```
//!
//! The session plans an audio graph ([`GraphPlan`]) and hands it to an
//! [`AudioBackend`]. [`RodioBackend`] plays through the default output
//! device; tests substitute a recording backend.

mod backend;
mod error;
mod plan;
mod session;

pub use backend::{AudioBackend, RodioBackend};
pub use error::AudioError;
pub use plan::{GraphPlan, SourcePlan, DEFAULT_TRACK_FILE};
pub use session::{AudioSession, AudioState, Gesture};
