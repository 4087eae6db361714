pub mod anthropic;
pub mod email;
pub mod openai;
pub mod redis;
pub mod replicate;
pub mod storage;
