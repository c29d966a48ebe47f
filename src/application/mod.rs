pub mod codec;
pub mod dto;
pub mod ports;
pub mod services;
