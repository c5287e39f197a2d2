mod turn_leases;

pub use turn_leases::{TurnLease, TurnLeases};
