//! StudyBuddy wire protocol
//!
//! Types shared by every layer of the chat session engine: identifiers, the
//! real-time event envelope exchanged over the socket, and the REST payloads
//! consumed for historical messages, group membership and course progress.
//!
//! # Components
//!
//! - [`ids`]: String-backed identifier newtypes
//! - [`events`]: Real-time inbound/outbound events and their JSON codec
//! - [`rest`]: REST response and request bodies
//! - [`ProtocolError`]: Encoding and decoding failures

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod errors;
pub mod events;
pub mod ids;
pub mod rest;

pub use errors::{ProtocolError, Result};
pub use events::{
    InboundEvent, MembershipChange, MembershipData, OutboundEvent, WireMessage, WireUser,
};
pub use ids::{CourseId, GroupId, LessonId, MessageId, UserId};
pub use rest::{
    CourseProgressResponse, GroupSummary, HistoricalMessage, LessonProgressRecord,
    LessonProgressUpdate, ProgressSummary,
};
