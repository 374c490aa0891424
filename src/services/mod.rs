// Service modules
pub mod catalog_service;
pub mod notification_service;
pub mod purchase_listener;
pub mod purchase_service;
pub mod receipt_service;
pub mod session;
pub mod status_store;
pub mod store_connection;
pub mod validation_service;

pub use catalog_service::CatalogService;
pub use notification_service::{NotificationLog, Notifier};
pub use purchase_listener::{ListenerHandle, PurchaseListener};
pub use purchase_service::PurchaseService;
pub use receipt_service::{AppleReceiptValidator, ReceiptValidator};
pub use session::{SessionPhase, SubscriptionSession};
pub use status_store::{Generation, StatusStore};
pub use store_connection::StoreConnection;
pub use validation_service::ValidationService;
