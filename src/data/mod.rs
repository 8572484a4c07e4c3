//! Data layer: core types, loading, filtering and transformation.
//!
//! Architecture:
//! ```text
//!  .csv / .json / .parquet
//!        │
//!        ▼
//!   ┌──────────┐
//!   │  loader  │  parse file → Dataset, drop non-numeric values
//!   └──────────┘
//!        │
//!        ▼
//!   ┌──────────┐
//!   │ Dataset  │  Vec<DataPoint>, metadata column index
//!   └──────────┘
//!        │
//!        ▼
//!   ┌──────────┐
//!   │  filter  │  apply metadata predicates → filtered indices
//!   └──────────┘
//!        │
//!        ▼
//!     values()  → analysis
//! ```

pub mod filter;
pub mod loader;
pub mod model;
pub mod transform;

pub use model::{DataPoint, Dataset, MetadataValue};
