/// Data layer: discovery, dialect guessing, parsing, alignment, statistics.
///
/// Architecture:
/// ```text
///   input dir + filters
///        │
///        ▼
///   ┌──────────┐
///   │  select  │  glob → sorted file set
///   └──────────┘
///        │  (per file)
///        ▼
///   ┌──────────┐     ┌──────────┐
///   │  sniff   │ ──▶ │  parser  │  delimiter/header → X, Y cells
///   └──────────┘     └──────────┘
///                         │
///                         ▼
///                 ┌────────────────┐
///                 │     align      │  AggregationContext, row-positional
///                 └────────────────┘
///                         │
///                         ▼
///                    ┌─────────┐
///                    │  stats  │  mean, population SD, N per row
///                    └─────────┘
/// ```

pub mod align;
pub mod model;
pub mod parser;
pub mod select;
pub mod sniff;
pub mod stats;
