//! Entity definitions. A Judgment is the aggregate root: it owns its
//! Suspects and its single Blame, and deleting it cascades.

pub mod blame;
pub mod judgment;
pub mod suspect;
pub mod user;
