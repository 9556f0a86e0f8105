//! Embassy async tasks
//!
//! Each task runs independently and communicates via channels.

pub mod buttons;
pub mod cover;

pub use buttons::buttons_task;
pub use cover::cover_task;
