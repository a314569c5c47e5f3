pub mod activity;
pub mod config;
pub mod errors;
pub mod flow;
pub mod flows;
pub mod llm_client;
pub mod routes;
pub mod state;
