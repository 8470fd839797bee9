//! Delivery of notifications to remote messaging endpoints.
//!
//! The wire protocol lives behind [`telegram::TelegramClientTrait`] so the
//! hook can be exercised against fakes without a network.
pub mod telegram;
