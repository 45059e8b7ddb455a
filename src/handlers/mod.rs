pub mod employee;
pub mod general;
pub mod record;
pub mod sale;
