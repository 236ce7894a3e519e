pub mod portone;
pub mod settlement_log;
