pub mod health;
pub mod helpscout;
