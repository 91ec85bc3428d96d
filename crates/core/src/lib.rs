//! # Serolab Core
//!
//! Core logic of the serology lab front-end.
//!
//! This crate contains:
//! - the test-descriptor codec that packs a test's identity into the backend's single name field
//! - the test catalog with per-session selection, and its flattening into submission records
//! - hydration of fetched analyses for results entry, editing and reports
//! - the backend client ([`LabApi`]) and the registration, results-entry and edit workflows
//!
//! **No server concerns**: the JSON gateway lives in `api-rest`, the command line in `serolab-cli`.

pub mod catalog;
pub mod client;
pub mod config;
pub mod constants;
pub mod descriptor;
mod error;
pub mod keyed;
pub mod reconcile;
pub mod report;
pub mod scan;
pub mod search;
pub mod selection;
pub mod token;
pub mod workflows;

pub use catalog::{display_label, Catalog, CatalogError, CatalogNode, TestLeaf, TestPath};
pub use client::{HttpLabApi, LabApi, PatientId, PatientRecord};
pub use config::CoreConfig;
pub use descriptor::{decode, encode, Descriptor};
pub use error::{LabError, LabResult};
pub use reconcile::{hydrate, reconstruct_on_save, DisplayAnalysis};
pub use report::{group_for_report, PatientReport, ReportRow, ReportTree};
pub use scan::{parse_scanned_id, results_path, results_url};
pub use search::filter_patients;
pub use selection::{flatten, selected_descriptors};
pub use token::{is_token_expired, StoredSession, TokenStore};
pub use workflows::{
    Demographics, PatientEdit, RegistrationReceipt, RegistrationSession, ResultInput,
    ResultsEntry, SubmissionOutcome,
};
