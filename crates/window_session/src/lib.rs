//! # Window Session
//!
//! Windowing session and event-dispatch core: owns native windows, routes
//! native callbacks to per-window signals and drives a multi-window main loop.
//!
//! ## Features
//!
//! - **Handle Registry**: native handles resolve to their owning window by id,
//!   so windows can move freely in memory
//! - **Typed Signals**: one multi-subscriber signal per window event kind
//! - **Safe Main Loop**: closed windows are collected first and erased after
//!   the iteration over live windows
//! - **Hints**: tagged init and window hints, loadable from TOML or RON
//! - **Backends**: GLFW (feature `glfw`) and an in-memory headless layer
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use window_session::prelude::*;
//!
//! fn main() -> Result<(), SessionError> {
//!     let mut session = Session::new(HeadlessBackend::new())?;
//!
//!     let window = session.create_window(800, 600, "Hello", None, None)?;
//!     window.on_key.connect(|window, input| {
//!         if input.key == Key::ESCAPE && input.action == Action::Press {
//!             window.set_should_close(true);
//!         }
//!     });
//!
//!     session.run();
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod backend;
pub mod config;
pub mod error;
pub mod event;
pub mod foundation;
pub mod hints;
pub mod input;
pub mod monitor;
pub mod registry;
pub mod signal;

mod dispatch;
mod session;
mod window;

#[cfg(test)]
mod tests;

pub use error::{DispatchError, ErrorCode, NativeError, RegistryError, SessionError, SessionResult};
pub use session::Session;
pub use signal::{Connection, Signal};
pub use window::{Window, WindowId};

/// Common imports for session users
pub mod prelude {
    pub use crate::{
        backend::{HeadlessBackend, Image, NativeHandle, WindowBackend},
        config::{Config, SessionConfig},
        event::{EventKind, NativeEvent},
        foundation::logging,
        hints::{ClientApi, InitHint, OpenGlProfile, Samples, WindowHint, WindowHints},
        input::{Action, Key, KeyInput, Modifiers, MouseButton, MouseInput},
        monitor::{Monitor, VideoMode},
        Session, SessionError, Window, WindowId,
    };
}
