pub mod label_issuer;
pub mod shipping_service;
pub mod tracker;
