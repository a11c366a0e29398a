//! Host side of the party word game: authoritative game state, the
//! controller registry, and the TCP server that keeps both phones in sync.

pub mod deck;
pub mod game;
pub mod network;
pub mod registry;
pub mod sync;
