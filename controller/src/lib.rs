//! Console controller for the party word game: one instance per team,
//! talking to the host over TCP.

pub mod input;
pub mod network;
pub mod view;
