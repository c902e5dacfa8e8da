pub mod emotion;
pub mod result;
