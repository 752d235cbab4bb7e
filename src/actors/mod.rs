//! Actor-based collection scheduling
//!
//! The scheduler runs as an independent async task, controlled through an
//! mpsc command channel. Request/response commands carry a oneshot sender.
//!
//! ```text
//!   main ──spawns──► SchedulerActor ──► Collector ──► ExporterMetrics
//!     │                    │                               ▲
//!     │ SchedulerHandle    └──► HealthState                │
//!     ▼                              ▲                     │
//!   API server ──────────────────────┴─────────────────────┘
//! ```

pub mod messages;
pub mod scheduler;
