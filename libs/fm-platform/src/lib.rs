//! Fault-management platform model
//!
//! Domain records and ports that the threshold alarm handlers call into:
//! - Alarms, managed objects, interfaces and metric types
//! - Escalation rule-sets and notification groups
//! - Lookup, selector, scheduling and template ports (`traits`)
//! - An in-memory platform for tests and offline replay (`memory_impl`)
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐     ┌──────────────┐     ┌──────────────────┐
//! │  Enricher   │────▶│  Evaluator   │────▶│ DeferredScheduler│
//! │ (per alarm) │     │ (rule-sets)  │     │  (delay, queue)  │
//! └─────────────┘     └──────────────┘     └──────────────────┘
//!        │                   │                      │
//!        ▼                   ▼                      ▼
//! ┌─────────────┐     ┌──────────────┐     ┌──────────────────┐
//! │  Catalogs   │     │ EscalationSt.│     │ NotificationGroup│
//! │ (metric/if) │     │  Selectors   │     │    Registry      │
//! └─────────────┘     └──────────────┘     └──────────────────┘
//! ```

pub mod error;
pub mod memory_impl;
pub mod template;
pub mod traits;
pub mod types;

pub use error::{PlatformError, Result};
pub use memory_impl::{
    InventoryFixture, MemoryNotificationGroup, MemoryPlatform, RecordingScheduler, SelectorFixture,
};
pub use template::PlaceholderRenderer;
pub use traits::{
    DeferredScheduler, EscalationStore, InterfaceCatalog, MetricCatalog, NotificationGroup,
    NotificationGroupRegistry, PlatformPorts, SelectorMatcher, TemplateRenderer,
};
pub use types::*;
