// Inbound webhooks from third-party services

pub mod stripe;
