// This module is only compiled during tests

pub mod mock_feed;
pub mod mock_signal;
