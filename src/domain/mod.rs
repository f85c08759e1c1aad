pub mod effect;
pub mod symbol;
