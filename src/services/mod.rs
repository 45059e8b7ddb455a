pub mod formula;
pub mod ledger;
pub mod lifecycle;
pub mod resolver;
pub mod roster;
