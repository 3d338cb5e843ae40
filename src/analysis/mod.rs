//! Model-backed analysis: who is responsible, and what to tell them.

pub mod analyzer;
pub mod message;

pub use analyzer::{blame_shares, BlameShare, Incident, ResponsibilityAnalyzer, SuspectVerdict};
pub use message::{BlameMessageGenerator, MessageContext};
