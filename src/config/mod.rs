pub mod security_config;
pub mod settings;
pub mod swagger_config;

pub use settings::Settings;
