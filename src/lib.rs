pub mod args;
pub mod arena;
pub mod clock;
pub mod database;
pub mod model;
pub mod rate_limit;
pub mod utils;
