//! Step definitions for message ingestion scenarios.


mod given;
mod then;
mod when;
