//! Voice Concierge - scripted voice assistant for a marketing site
//!
//! This library provides the turn-taking loop behind a "talk to us" widget:
//! - Speech output and input adapters over pluggable TTS/STT capabilities
//! - A keyword intent router with canned responses
//! - A session state machine that strictly alternates speaking and listening
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────┐
//! │        Presentation surface (host page)        │
//! └──────────────▲────────────────────┬───────────┘
//!                │ render/indicators  │ activate/close
//! ┌──────────────┴────────────────────▼───────────┐
//! │                 Session loop                   │
//! │   state machine  │  reveal  │  echo delay      │
//! └───────┬──────────────────┬──────────────▲─────┘
//!         │ speak/listen     │ route        │ events
//! ┌───────▼───────┐  ┌───────▼──────┐  ┌────┴─────┐
//! │ Speech output │  │ Intent router│  │  Speech  │
//! │  (TTS)        │  │              │  │  input   │
//! └───────────────┘  └──────────────┘  └──────────┘
//! ```

pub mod assistant;
pub mod config;
pub mod controls;
pub mod error;
pub mod intent;
pub mod session;
pub mod surface;
pub mod voice;

pub use assistant::Assistant;
pub use config::Config;
pub use error::{Error, Result};
pub use intent::{IntentCategory, Routed, SideEffect, Utterance, route, route_text};
pub use session::{Session, SessionEvent, SessionHandle, SessionState};
pub use surface::{PresentationSurface, TerminalSurface};
