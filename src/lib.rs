//! # insiderforms
//!
//! A Rust library for reading insider-trading disclosure forms that are filed
//! as XFA PDFs, and mapping their raw field text into typed values.
//!
//! ## What this crate does
//!
//! 1. **Extract XFA data** — walks `/Root/AcroForm/XFA` and pulls out the
//!    `datasets` packet, decoded and parsed into an owned XML tree.
//! 2. **Look up fields** — resolves slash-separated field paths anywhere in
//!    that tree; a missing field reads as an empty string.
//! 3. **Parse money** — turns loosely formatted amounts such as `"SGD$16.9m"`
//!    into numbers.
//! 4. **Map forms** — exposes each notification form as a record with
//!    lazily computed issuer, insider, trade date, holdings and consideration.
//!
//! ## Quick example
//!
//! ```no_run
//! use insiderforms::Form1;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let form = Form1::from_path("form1.pdf")?;
//!
//! println!("Issuer  : {}", form.issuer_name());
//! println!("Insider : {}", form.insider_name());
//! println!("Paid    : {}", form.amt_consideration());
//! println!("{}", form.render()?);
//! # Ok(())
//! # }
//! ```

use thiserror::Error;

mod forms;
mod money;
mod pdf_utils;
mod security;
mod xfa;
mod xml;

pub use forms::{Form1, FormKind, IssuerType, NotificationForm, NotificationSection};
pub use money::parse_money;
pub use security::{format_holding, SecurityHolding, SecurityType};
pub use xfa::{extract_xml_from_xfa, XfaExtractor};
pub use xml::{Descendants, XmlElement, XFA_DATA_NAMESPACE, XFA_NAMESPACES};

// ── Configuration ────────────────────────────────────────────────────────────

/// Runtime configuration for [`XfaExtractor`].
#[derive(Debug, Clone, Default)]
pub struct ExtractorConfig {
    /// If set, [`XfaExtractor::extract`] returns
    /// [`ExtractError::PacketSizeExceeded`] when the decoded `datasets`
    /// packet is larger than this byte count.
    pub max_datasets_size: Option<usize>,

    /// If set, the decoded datasets XML is written to this path before it is
    /// parsed. Useful when mapping a new form schema.
    pub debug_xml_path: Option<String>,
}

// ── Error type ───────────────────────────────────────────────────────────────

/// Every error that this crate can produce.
#[derive(Error, Debug)]
pub enum ExtractError {
    /// A filesystem I/O error occurred (e.g. when loading a PDF or writing
    /// the debug dump).
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// The underlying lopdf parser returned an error.
    #[error("PDF parse error: {0}")]
    ParseError(#[from] lopdf::Error),

    /// A required structural key (`/Root`, `/AcroForm` or `/XFA`) is absent.
    #[error("Missing attribute in PDF: {0}")]
    MissingPdfKey(&'static str),

    /// The `/XFA` entry exists but does not have the expected shape.
    #[error("Malformed XFA entry: {0}")]
    InvalidXfa(String),

    /// The `/XFA` entry carries no `datasets` packet.
    #[error("No XFA datasets packet found in this PDF")]
    NoXfaDatasets,

    /// The datasets packet is not valid UTF-8.
    #[error("Unable to decode XFA datasets as UTF-8: {0}")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),

    /// The datasets packet is not well-formed XML.
    #[error("Unable to parse XFA datasets XML: {0}")]
    InvalidXml(#[from] roxmltree::Error),

    /// The datasets packet exceeds the configured `max_datasets_size` limit.
    #[error("XFA datasets packet exceeds the configured maximum size")]
    PacketSizeExceeded,

    /// A field accessor was called on a form whose mapping is not implemented.
    #[error("{0} field mapping is not implemented")]
    UnsupportedForm(FormKind),

    /// A non-empty security count field is not a plain integer.
    #[error("Security count at '{field}' is not an integer: {value:?}")]
    InvalidCount {
        field: String,
        value: String,
        #[source]
        source: std::num::ParseIntError,
    },
}

impl ExtractError {
    /// Returns `true` when the failure comes from locating or decoding the XFA
    /// payload, as opposed to mapping its fields.
    pub fn is_extraction_error(&self) -> bool {
        !matches!(
            self,
            ExtractError::UnsupportedForm(_) | ExtractError::InvalidCount { .. }
        )
    }
}

/// Convenience alias used throughout this crate.
pub type Result<T> = std::result::Result<T, ExtractError>;
