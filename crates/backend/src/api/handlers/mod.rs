pub mod d100_daily_digest;
pub mod d101_daily_insights;
pub mod d102_reports;
pub mod u101_ask_question;
