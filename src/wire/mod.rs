//! The render channel's wire contract.
//!
//! Two flat message shapes cross the channel as plain JSON values
//! (structurally-cloned data, never live references), each checked by a
//! structural validator at both the send and receive boundaries.

pub(crate) mod validate;

pub mod message;
