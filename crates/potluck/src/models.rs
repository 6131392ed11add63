//! These models represent the objects passed between agents and the chat backend
//!
//! A conversation is a list of [`message::Message`] values. Each agent sees the
//! whole list and turns it into the provider's wire format right before a
//! completion request, so the internal model does not mirror any one API.
pub mod message;
pub mod role;
