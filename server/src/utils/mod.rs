pub mod error;
pub mod extract;
pub mod qr;
pub mod response;
