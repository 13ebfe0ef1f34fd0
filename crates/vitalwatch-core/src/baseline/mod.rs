//! Per-subject adaptive baselines.
//!
//! ## Architecture
//!
//! ```text
//!   Observation ──► BaselineStore ──► SubjectBaseline (per subject)
//!                        │
//!                        ├── seeded from global normal ranges
//!                        ├── incremental weighted update (1 / (n + 1))
//!                        └── optional BaselinePersistence (load on first use, save on update)
//! ```

pub mod persistence;
pub mod store;
pub mod types;

pub use persistence::{BaselinePersistence, InMemoryBaseline, JsonFileBaseline};
pub use store::BaselineStore;
pub use types::{NormalRange, SubjectBaseline};
