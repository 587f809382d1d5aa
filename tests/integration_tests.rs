// Integration tests for insiderforms.
//
// PDFs are assembled in memory with lopdf so the extraction path runs without
// real filings. Tests that need actual SGX filings read them from
// `tests/fixtures/` and are marked `#[ignore]`.

use insiderforms::{
    extract_xml_from_xfa, ExtractError, ExtractorConfig, Form1, FormKind, NotificationForm,
    SecurityType, XfaExtractor,
};
use lopdf::{dictionary, Dictionary, Document, Object, Stream};
use std::io::Cursor;

const DATASETS: &str = r#"<xfa:datasets xmlns:xfa="http://www.xfa.org/schema/xfa-data/1.0/">
  <xfa:data>
    <SFA289>
      <Form1>
        <Part1>
          <notifyingAtApptTime>0</notifyingAtApptTime>
          <listedIssuer><name>ValueCap Ltd</name><type>3</type></listedIssuer>
          <nameDirector>Lim Mei Ling</nameDirector>
        </Part1>
        <Part3>
          <Transaction>
            <dateAquisition>11/01/2016</dateAquisition>
            <amtConsideration>S$250k</amtConsideration>
            <T1Ord>
              <before><num><tot>100,000</tot></num></before>
              <after><num><tot>150,000</tot></num></after>
            </T1Ord>
          </Transaction>
        </Part3>
      </Form1>
    </SFA289>
  </xfa:data>
</xfa:datasets>"#;

// ── PDF builders ─────────────────────────────────────────────────────────────

/// A one-page PDF whose catalog gets the `/AcroForm` built by `acro_form`.
fn build_pdf<F>(acro_form: F) -> Vec<u8>
where
    F: FnOnce(&mut Document) -> Option<Dictionary>,
{
    let mut doc = Document::with_version("1.7");
    let pages_id = doc.new_object_id();

    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
    });
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![Object::from(page_id)],
            "Count" => 1i64,
        }),
    );

    let mut catalog = dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    };
    if let Some(form) = acro_form(&mut doc) {
        let form_id = doc.add_object(form);
        catalog.set("AcroForm", form_id);
    }
    let catalog_id = doc.add_object(catalog);
    doc.trailer.set("Root", catalog_id);

    let mut buf = Vec::new();
    doc.save_to(&mut buf).expect("failed to save test PDF");
    buf
}

/// An `/AcroForm` whose `/XFA` is an array of `(label, stream)` packets.
fn xfa_packets(doc: &mut Document, packets: &[(&str, &[u8])]) -> Dictionary {
    let mut xfa = Vec::new();
    for (label, content) in packets {
        let stream_id = doc.add_object(Stream::new(Dictionary::new(), content.to_vec()));
        xfa.push(Object::string_literal(*label));
        xfa.push(stream_id.into());
    }
    dictionary! {
        "Fields" => Vec::<Object>::new(),
        "XFA" => xfa,
    }
}

fn form1_pdf() -> Vec<u8> {
    build_pdf(|doc| {
        Some(xfa_packets(
            doc,
            &[
                ("preamble", &b"<xdp:xdp xmlns:xdp=\"http://ns.adobe.com/xdp/\">"[..]),
                ("template", &b"<template/>"[..]),
                ("datasets", DATASETS.as_bytes()),
                ("postamble", &b"</xdp:xdp>"[..]),
            ],
        ))
    })
}

// ── Extraction ───────────────────────────────────────────────────────────────

#[test]
fn extracts_datasets_packet_from_xfa_array() {
    let extractor = XfaExtractor::from_bytes(&form1_pdf()).unwrap();
    assert!(extractor.has_xfa());

    let root = extractor.extract().unwrap().unwrap();
    assert_eq!(root.name, "datasets");
    assert_eq!(root.get_text("Form1/Part1/nameDirector"), "Lim Mei Ling");
}

#[test]
fn form1_from_reader_maps_fields() {
    let form = Form1::from_reader(Cursor::new(form1_pdf())).unwrap();

    assert!(!form.is_notifying_at_appt_time());
    assert_eq!(form.issuer_name(), "ValueCap Ltd");
    assert_eq!(form.issuer_type().to_string(), "Real Estate Investment Trust");
    assert_eq!(form.trade_date(), "11/01/2016");
    assert_eq!(form.amt_consideration(), 250_000.0);

    let before = form.securities_before().unwrap().unwrap();
    let after = form.securities_after().unwrap().unwrap();
    assert_eq!(before[&SecurityType::OrdinaryShares], 100_000);
    assert_eq!(after[&SecurityType::OrdinaryShares], 150_000);
}

#[test]
fn notification_form_from_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("form1.pdf");
    std::fs::write(&path, form1_pdf()).unwrap();

    let form = NotificationForm::from_path(FormKind::Form1, &path).unwrap();
    assert_eq!(form.insider_name().unwrap(), "Lim Mei Ling");

    let form = NotificationForm::from_path(FormKind::Form6, &path).unwrap();
    assert!(matches!(
        form.trade_date(),
        Err(ExtractError::UnsupportedForm(FormKind::Form6))
    ));
}

#[test]
fn single_stream_xdp_is_searched_whole() {
    let xdp = format!(
        r#"<xdp:xdp xmlns:xdp="http://ns.adobe.com/xdp/"><template/>{DATASETS}</xdp:xdp>"#
    );
    let pdf = build_pdf(|doc| {
        let stream_id = doc.add_object(Stream::new(Dictionary::new(), xdp.into_bytes()));
        Some(dictionary! { "XFA" => stream_id })
    });

    let form = Form1::from_reader(Cursor::new(pdf)).unwrap();
    assert_eq!(form.insider_name(), "Lim Mei Ling");
    assert!(form.securities_before().unwrap().is_some());
}

#[test]
fn compressed_datasets_stream_is_decoded() {
    let pdf = build_pdf(|doc| {
        let mut stream = Stream::new(Dictionary::new(), DATASETS.as_bytes().to_vec());
        stream.compress().unwrap();
        let stream_id = doc.add_object(stream);
        Some(dictionary! {
            "XFA" => vec![Object::string_literal("datasets"), stream_id.into()],
        })
    });

    let root = extract_xml_from_xfa(Cursor::new(pdf)).unwrap().unwrap();
    assert_eq!(root.get_text("Form1/Part1/listedIssuer/name"), "ValueCap Ltd");
}

#[test]
fn xfa_array_without_datasets_extracts_nothing() {
    let pdf = build_pdf(|doc| Some(xfa_packets(doc, &[("template", &b"<template/>"[..])])));

    let extractor = XfaExtractor::from_bytes(&pdf).unwrap();
    assert!(extractor.extract().unwrap().is_none());

    let err = Form1::from_reader(Cursor::new(pdf)).unwrap_err();
    assert!(matches!(err, ExtractError::NoXfaDatasets));
}

// ── Extraction failures ──────────────────────────────────────────────────────

#[test]
fn missing_acroform_is_reported() {
    let pdf = build_pdf(|_| None);
    let extractor = XfaExtractor::from_bytes(&pdf).unwrap();

    assert!(!extractor.has_xfa());
    let err = extractor.extract().unwrap_err();
    assert!(matches!(err, ExtractError::MissingPdfKey("/AcroForm")));
    assert!(err.is_extraction_error());
}

#[test]
fn missing_xfa_entry_is_reported() {
    let pdf = build_pdf(|_| Some(dictionary! { "Fields" => Vec::<Object>::new() }));
    let extractor = XfaExtractor::from_bytes(&pdf).unwrap();

    assert!(!extractor.has_xfa());
    assert!(matches!(
        extractor.extract(),
        Err(ExtractError::MissingPdfKey("/XFA"))
    ));
}

#[test]
fn xfa_entry_of_wrong_type_is_reported() {
    let pdf = build_pdf(|_| Some(dictionary! { "XFA" => 42i64 }));
    let extractor = XfaExtractor::from_bytes(&pdf).unwrap();
    assert!(matches!(extractor.extract(), Err(ExtractError::InvalidXfa(_))));
}

#[test]
fn datasets_label_without_stream_is_reported() {
    let pdf = build_pdf(|_| {
        Some(dictionary! {
            "XFA" => vec![Object::string_literal("datasets"), Object::Integer(1)],
        })
    });
    let extractor = XfaExtractor::from_bytes(&pdf).unwrap();
    assert!(matches!(extractor.extract(), Err(ExtractError::InvalidXfa(_))));
}

#[test]
fn non_utf8_datasets_are_reported() {
    let pdf = build_pdf(|doc| Some(xfa_packets(doc, &[("datasets", &b"<a\xff>"[..])])));
    let err = XfaExtractor::from_bytes(&pdf).unwrap().extract().unwrap_err();
    assert!(matches!(err, ExtractError::InvalidUtf8(_)));
}

#[test]
fn malformed_datasets_xml_is_reported() {
    let pdf = build_pdf(|doc| Some(xfa_packets(doc, &[("datasets", &b"<a><b></a>"[..])])));
    let err = Form1::from_reader(Cursor::new(pdf)).unwrap_err();
    assert!(matches!(err, ExtractError::InvalidXml(_)));
    assert!(err.is_extraction_error());
}

#[test]
fn from_bytes_rejects_empty_slice() {
    assert!(XfaExtractor::from_bytes(&[]).is_err());
}

#[test]
fn from_bytes_rejects_non_pdf() {
    assert!(XfaExtractor::from_bytes(b"not a pdf").is_err());
}

#[test]
fn from_path_reports_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let err = Form1::from_path(dir.path().join("absent.pdf")).unwrap_err();
    assert!(matches!(err, ExtractError::IoError(_)));
}

// ── ExtractorConfig ──────────────────────────────────────────────────────────

#[test]
fn default_config_is_permissive() {
    let cfg = ExtractorConfig::default();
    assert!(cfg.max_datasets_size.is_none());
    assert!(cfg.debug_xml_path.is_none());
}

#[test]
fn oversized_datasets_packet_is_rejected() {
    let mut extractor = XfaExtractor::from_bytes(&form1_pdf()).unwrap();
    extractor.config_mut().max_datasets_size = Some(16);
    assert!(matches!(
        extractor.extract(),
        Err(ExtractError::PacketSizeExceeded)
    ));

    extractor.config_mut().max_datasets_size = Some(DATASETS.len());
    assert!(extractor.extract().unwrap().is_some());
}

#[test]
fn debug_path_receives_decoded_xml() {
    let dir = tempfile::tempdir().unwrap();
    let pdf_path = dir.path().join("form1.pdf");
    std::fs::write(&pdf_path, form1_pdf()).unwrap();

    let dump = dir.path().join("dumps").join("form1.xml");
    let cfg = ExtractorConfig {
        debug_xml_path: Some(dump.to_string_lossy().into_owned()),
        ..Default::default()
    };
    let extractor = XfaExtractor::with_config(&pdf_path, cfg).unwrap();
    extractor.extract().unwrap();

    assert_eq!(std::fs::read_to_string(&dump).unwrap(), DATASETS);
}

// ── ExtractError display ─────────────────────────────────────────────────────

#[test]
fn error_display_is_non_empty() {
    let errors: &[ExtractError] = &[
        ExtractError::MissingPdfKey("/Root"),
        ExtractError::InvalidXfa("test".into()),
        ExtractError::NoXfaDatasets,
        ExtractError::PacketSizeExceeded,
        ExtractError::UnsupportedForm(FormKind::Form2),
    ];
    for e in errors {
        assert!(!e.to_string().is_empty(), "empty display for {e:?}");
    }
    assert_eq!(
        ExtractError::UnsupportedForm(FormKind::Form2).to_string(),
        "Form 2 field mapping is not implemented"
    );
}

// ── Fixture-based tests (ignored without real PDFs) ───────────────────────────

/// To run: place an SGX Form 1 filing at `tests/fixtures/XFA_form1.pdf` and
/// run with `--include-ignored`.
#[test]
#[ignore]
fn fixture_form1_renders() {
    let form = Form1::from_path("tests/fixtures/XFA_form1.pdf")
        .expect("place tests/fixtures/XFA_form1.pdf to run this test");

    assert!(!form.issuer_name().is_empty());
    assert!(!form.trade_date().is_empty());
    let text = form.render().unwrap();
    assert!(text.contains("INSIDER TITLE: Director/CEO"));
}
