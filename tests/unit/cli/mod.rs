pub mod args;
pub mod reads;
