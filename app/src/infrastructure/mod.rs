pub mod command;
pub mod identity;
pub mod ioc;
pub mod service;
