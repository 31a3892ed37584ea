pub mod config_ops;
pub mod slide_ops;
