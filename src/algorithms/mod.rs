pub mod a_star;
pub mod common;
pub mod d_star_lite;
pub mod frontier;
