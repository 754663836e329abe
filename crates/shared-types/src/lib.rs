//! Boundary records shared by the compliance engine and its host services

pub mod types;

pub use types::{
    ComplianceScore, DetectionInput, LayoutValidation, SymbolDetection, SymbolValidation,
    TermValidation, TextRegion, ValidationReport,
};
