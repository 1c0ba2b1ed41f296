pub mod game_handlers;
pub mod handler;
pub mod puzzle_handlers;

pub use handler::{ws_index, ChessWebSocket};
