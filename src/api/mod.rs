pub mod client;

pub use client::{ByteStream, StreamClient};
