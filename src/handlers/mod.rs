pub mod api;
pub mod batches;
pub mod generate;
pub mod tracks;
pub mod voices;
