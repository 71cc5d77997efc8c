// Adapters from app ports to external services

pub mod groq_client;

pub use groq_client::GroqClient;
