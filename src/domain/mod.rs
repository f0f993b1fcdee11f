pub mod csv;
pub mod error;
pub mod extraction;
pub mod llm_config;
pub mod scripts;
