pub mod bank_details;
pub mod banks;
pub mod commission;
pub mod health;
pub mod initialize_payment;
pub mod payment_history;
pub mod verify_payment;
pub mod wallet_balance;
pub mod webhook;
pub mod withdraw;
