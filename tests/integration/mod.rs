mod leaderboard_flow_tests;
mod main_flow_tests;
