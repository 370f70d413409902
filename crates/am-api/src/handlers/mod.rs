pub mod addresses;
pub mod health;
