// src/core/mod.rs

/// Result types shared by every scanner: subdomain reports, port reports, host records.
pub mod models;

/// The network engines (resolver, subdomain aggregator, port prober, info scanner)
/// and the `Recon` facade over them.
pub mod scanner;

/// Normalization of user-supplied tool arguments.
pub mod target;
