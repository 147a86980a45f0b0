//! Typed REST clients for the cloud services the takeoff server talks to.
//!
//! Provides the design automation client (engines, activities, workitem
//! submission), the asset and cost catalog clients, workitem callback
//! parsing, storage URN handling and the shared retry policy. The
//! service clients implement the seam traits of `takeoff-core`.

pub mod api;
pub mod assets;
pub mod config;
pub mod cost;
pub mod design_automation;
pub mod messages;
pub mod retry;
pub mod storage;

pub use api::{ForgeApi, ForgeApiError};
pub use assets::AssetsApi;
pub use config::{DesignAutomationConfig, ForgeConfig};
pub use cost::CostApi;
pub use design_automation::DesignAutomationApi;
