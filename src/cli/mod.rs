pub mod convert;
pub mod plans;
pub mod rates;
pub mod setup;
pub mod subscription;
pub mod ui;
