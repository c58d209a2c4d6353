/// External data sources.
///
/// Submodules:
/// - `tide` — Kartverket water level API client and response parsing.

pub mod tide;
