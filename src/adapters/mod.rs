pub mod store;
pub mod terminal;
