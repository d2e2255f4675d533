pub mod manager;
pub mod store;
pub mod token;
