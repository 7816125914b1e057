pub mod bank_service;
pub mod commission;
pub mod gateway_client;
pub mod ledger_service;
pub mod notification_service;
pub mod payment_repository;
pub mod settlement_service;
pub mod webhook_service;
