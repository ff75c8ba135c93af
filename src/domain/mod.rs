pub mod ir_codes;
pub mod models;
pub mod settings;
