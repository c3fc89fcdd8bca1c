pub mod chat;
pub mod eval;
pub mod lookup;
pub mod valves;
