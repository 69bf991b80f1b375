pub mod client;
pub mod types;

pub use client::{rank_matches, SkriptLangClient};
