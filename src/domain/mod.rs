pub mod courier;
pub mod errors;
pub mod label;
pub mod pincode;
pub mod ports;
pub mod rates;
pub mod tracking;
