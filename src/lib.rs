//! Tabletop Dice
//!
//! Physics-driven dice rolls: dice are thrown as rigid bodies, watched until
//! they come to rest, and read from the face that ends up on top.

pub mod dice3d;
