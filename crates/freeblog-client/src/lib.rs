//! Client-side helpers for the freeblog HTTP API
//!
//! * [`Client`] - `find`/`submit`/`exec`/`del` request helpers, plus typed
//!   entry and file endpoints in [`api`]
//! * [`Session`] - identity read from the session cookies
//! * [`upload`] - the file upload form
//! * [`popup`] - global click notifications for pop-up menus

pub mod api;
pub mod client;
pub mod error;
pub mod popup;
pub mod session;
pub mod upload;

pub use client::{Client, ResponseBody, ResponseFormat, SubmitMethod};
pub use session::{Session, SessionSchema};

pub const LOG_TARGET: &str = "freeblog::client";
