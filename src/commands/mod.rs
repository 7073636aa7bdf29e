pub mod chunk;
pub mod diff;
pub mod reconstruct;
pub mod simulate;
