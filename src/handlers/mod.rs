pub mod shipping;
