pub mod base64url;
pub mod user_agent;
