pub mod config;
pub mod csv;
pub mod llm_clients;
pub mod response;
pub mod security;
pub mod storage;
