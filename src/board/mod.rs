pub mod market_board;
