use crate::pdf_utils;
use crate::{ExtractError, ExtractorConfig, Result, XmlElement};
use lopdf::{Document, Object};
use std::io::Read;
use std::path::Path;

// ── XfaExtractor ─────────────────────────────────────────────────────────────

/// Pulls the XFA `datasets` packet out of a PDF and parses it.
///
/// # Creating an extractor
///
/// ```no_run
/// use insiderforms::{ExtractorConfig, XfaExtractor};
///
/// // From a file path
/// let x = XfaExtractor::from_path("form1.pdf").unwrap();
///
/// // From an in-memory buffer
/// let bytes = std::fs::read("form1.pdf").unwrap();
/// let x = XfaExtractor::from_bytes(&bytes).unwrap();
///
/// // With custom configuration
/// let cfg = ExtractorConfig {
///     debug_xml_path: Some("form1.xml".into()),
///     ..Default::default()
/// };
/// let x = XfaExtractor::with_config("form1.pdf", cfg).unwrap();
/// ```
pub struct XfaExtractor {
    document: Document,
    config: ExtractorConfig,
}

impl XfaExtractor {
    // ── Constructors ──────────────────────────────────────────────────────────

    /// Load a PDF from the file system.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::with_config(path, ExtractorConfig::default())
    }

    /// Load a PDF from an in-memory byte slice.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        Ok(Self {
            document: Document::load_mem(data)?,
            config: ExtractorConfig::default(),
        })
    }

    /// Load a PDF from any reader, e.g. an open [`std::fs::File`].
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        Ok(Self {
            document: Document::load_from(reader)?,
            config: ExtractorConfig::default(),
        })
    }

    /// Load a PDF from the file system with a custom [`ExtractorConfig`].
    pub fn with_config<P: AsRef<Path>>(path: P, config: ExtractorConfig) -> Result<Self> {
        Ok(Self {
            document: Document::load(path)?,
            config,
        })
    }

    /// Mutable access to the active configuration.
    pub fn config_mut(&mut self) -> &mut ExtractorConfig {
        &mut self.config
    }

    // ── Discovery ─────────────────────────────────────────────────────────────

    /// Returns `true` when the document has a `/Root/AcroForm/XFA` entry.
    pub fn has_xfa(&self) -> bool {
        self.xfa_entry().is_ok()
    }

    /// Returns the raw bytes of the `datasets` packet, or `Ok(None)` when the
    /// XFA entry has no such packet.
    ///
    /// The `/XFA` entry is either an array of alternating packet names and
    /// streams, or a single stream holding the whole XDP document:
    ///
    /// ```text
    /// /XFA [ (preamble) 10 0 R (template) 11 0 R (datasets) 12 0 R … ]
    /// /XFA 13 0 R
    /// ```
    ///
    /// In the single-stream case the whole XDP is returned; it contains the
    /// datasets packet and field lookups search the entire tree.
    pub fn datasets_packet(&self) -> Result<Option<Vec<u8>>> {
        match self.xfa_entry()? {
            Object::Array(packets) => self.find_datasets(packets),
            Object::Stream(stream) => {
                log::debug!("XFA entry is a single XDP stream");
                Ok(Some(pdf_utils::stream_bytes(stream)))
            }
            other => Err(ExtractError::InvalidXfa(format!(
                "expected an array or a stream, found {}",
                other.enum_variant()
            ))),
        }
    }

    // ── Extraction ────────────────────────────────────────────────────────────

    /// Extract and parse the `datasets` packet.
    ///
    /// Returns `Ok(None)` when the document has an XFA entry without a
    /// datasets packet. Any structural, decoding or XML error is returned as
    /// an [`ExtractError`]; no partial tree is ever produced.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use insiderforms::XfaExtractor;
    ///
    /// let extractor = XfaExtractor::from_path("form1.pdf").unwrap();
    /// if let Some(root) = extractor.extract().unwrap() {
    ///     println!("{}", root.get_text("Form1/Part1/nameDirector"));
    /// }
    /// ```
    pub fn extract(&self) -> Result<Option<XmlElement>> {
        let bytes = match self.datasets_packet()? {
            Some(bytes) => bytes,
            None => return Ok(None),
        };

        if let Some(max) = self.config.max_datasets_size {
            if bytes.len() > max {
                return Err(ExtractError::PacketSizeExceeded);
            }
        }

        let xml = String::from_utf8(bytes)?;

        if let Some(ref path) = self.config.debug_xml_path {
            if let Some(dir) = Path::new(path).parent() {
                if !dir.as_os_str().is_empty() {
                    std::fs::create_dir_all(dir)?;
                }
            }
            std::fs::write(path, &xml)?;
            log::debug!("wrote XFA datasets to {path}");
        }

        XmlElement::parse(&xml).map(Some)
    }

    // ── Accessors ─────────────────────────────────────────────────────────────

    /// Returns a reference to the underlying [`lopdf::Document`].
    pub fn document(&self) -> &Document {
        &self.document
    }

    /// Returns a reference to the active [`ExtractorConfig`].
    pub fn config(&self) -> &ExtractorConfig {
        &self.config
    }

    // ── Private ──────────────────────────────────────────────────────────────

    /// Walk trailer → `/Root` → `/AcroForm` → `/XFA`, resolving references.
    fn xfa_entry(&self) -> Result<&Object> {
        let root = pdf_utils::get_resolved(&self.document, &self.document.trailer, b"Root")
            .and_then(|o| o.as_dict().ok())
            .ok_or(ExtractError::MissingPdfKey("/Root"))?;

        let acro_form = pdf_utils::get_resolved(&self.document, root, b"AcroForm")
            .and_then(|o| o.as_dict().ok())
            .ok_or(ExtractError::MissingPdfKey("/AcroForm"))?;

        pdf_utils::get_resolved(&self.document, acro_form, b"XFA")
            .ok_or(ExtractError::MissingPdfKey("/XFA"))
    }

    /// Scan `[name, stream, name, stream, …]` for the `datasets` packet; the
    /// packet is the object right after its label.
    fn find_datasets(&self, packets: &[Object]) -> Result<Option<Vec<u8>>> {
        let label = packets
            .iter()
            .position(|o| pdf_utils::object_text(o).as_deref() == Some("datasets"));

        let index = match label {
            Some(i) => i,
            None => {
                log::warn!("XFA array has no datasets packet");
                return Ok(None);
            }
        };

        let value = packets.get(index + 1).ok_or_else(|| {
            ExtractError::InvalidXfa("datasets label has no packet after it".into())
        })?;
        let stream = pdf_utils::resolve(&self.document, value)?
            .as_stream()
            .map_err(|_| ExtractError::InvalidXfa("datasets packet is not a stream".into()))?;

        log::debug!("found XFA datasets packet at index {}", index + 1);
        Ok(Some(pdf_utils::stream_bytes(stream)))
    }
}

/// Read a PDF from `reader` and return the root of its XFA datasets XML.
///
/// Shorthand for [`XfaExtractor::from_reader`] followed by
/// [`XfaExtractor::extract`].
pub fn extract_xml_from_xfa<R: Read>(reader: R) -> Result<Option<XmlElement>> {
    XfaExtractor::from_reader(reader)?.extract()
}
