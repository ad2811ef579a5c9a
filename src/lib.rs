//! gsbot - chat-driven administration for hosted game servers.
//!
//! Messages that mention the bot and carry a slash command
//! (`@<self> /start 0`) are routed through an API-key gate and a chat
//! allow-list to a small fixed set of commands that list, inspect, start
//! and stop servers on a game-hosting provider.

pub mod bot;
pub mod chat;
pub mod commands;
pub mod config;
pub mod db;
pub mod error;
pub mod hosting;
pub mod http;
pub mod metrics;
pub mod pagination;
pub mod router;
pub mod service;
pub mod telemetry;
