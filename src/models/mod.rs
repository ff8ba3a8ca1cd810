pub mod record;
pub mod requests;
pub mod responses;
pub mod state;
