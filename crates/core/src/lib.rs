pub mod config;
pub mod config_loader;
pub mod error;
pub mod events;
pub mod position;
pub mod traits;

pub use config::{AppConfig, ExecutionMode, KiteConfig, SessionConfig, TelegramConfig};
pub use config_loader::ConfigLoader;
pub use error::{ConfigError, GatewayError, OrderError};
pub use events::{
    Bar, BrokerPosition, Direction, OrderKind, OrderRequest, ProductKind, Quote, Side, Signal,
};
pub use position::{ExitReason, Position, PositionStatus};
pub use traits::{Broker, Notifier};
