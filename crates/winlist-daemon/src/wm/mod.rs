//! bspwm and X11 state access
//!
//! This module talks to the window manager through its command-line
//! surface. Two kinds of access exist:
//!
//! - One-shot queries (`bspc query`, `bspc wm --get-status`, `wmctrl`)
//!   that return a fresh snapshot of ids or per-window metadata.
//! - A persistent subscription (`bspc subscribe`) that emits one line per
//!   state change for the lifetime of the daemon.
//!
//! Queries never fail from the caller's point of view: a query that
//! errors or returns nothing yields an empty result for that cycle. Only
//! the subscription carries real errors, because its death means the
//! daemon is blind and has to terminate.

mod error;
mod events;
mod query;
mod types;
mod wminfo;

pub use error::WmError;
pub use events::EventSubscription;
pub use query::{BspcQuery, NodeQuery};
pub use types::{Geometry, MonitorReport, WindowInfo, WindowRecord};
pub use wminfo::{InfoQuery, WmctrlQuery};
