pub mod client;
pub mod subscription;
