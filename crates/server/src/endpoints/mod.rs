//! # HTTPエンドポイント

pub mod helius;
pub mod info;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use helius::handle_helius;
pub use info::{handle_health, handle_info};
