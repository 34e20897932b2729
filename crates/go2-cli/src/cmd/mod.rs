pub mod batch;
pub mod menu;
pub mod serve;
