//! Chess rules, game sessions with clocks, puzzles, puzzle rush and bot
//! tier progression, plus the WebSocket front end that hosts them.

pub mod config;
pub mod error;
pub mod game;
pub mod models;
pub mod routes;
pub mod suppliers;
pub mod websocket;
