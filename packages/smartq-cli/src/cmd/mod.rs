pub mod account;
pub mod login;
pub mod register;
pub mod shops;
