pub mod attacks;
pub mod execute;
pub mod movegen;
pub mod perft;
pub mod tables;
pub mod types;
