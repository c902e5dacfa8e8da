pub mod cache;
pub mod config;
pub mod disambiguation;
pub mod lexicon;
pub mod pipeline;
pub mod prepare;
pub mod smoothing;
pub mod strategy;
pub mod text;
