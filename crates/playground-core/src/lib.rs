pub mod assembler;
pub mod event_bus;
pub mod ports;
pub mod router;
pub mod session;
pub mod splitter;
pub mod store;
