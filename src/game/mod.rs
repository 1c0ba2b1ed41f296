pub mod board;
pub mod bots;
pub mod clock;
pub mod notation;
pub mod outcome;
pub mod puzzle;
pub mod rules;
pub mod rush;
pub mod session;
