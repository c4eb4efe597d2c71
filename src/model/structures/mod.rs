pub mod battle;
pub mod battle_query;
pub mod category;
pub mod leaderboard_row;
pub mod rating;
