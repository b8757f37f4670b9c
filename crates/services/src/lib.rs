mod services;

pub use services::{ApiConfigService, ApiConfigServiceBuilder, ConfigStatus, ServiceError};
