pub mod discovery;
pub mod score;
