use crate::money::parse_money;
use crate::security::{format_holding, SecurityHolding, SecurityType};
use crate::xml::XFA_NAMESPACES;
use crate::{extract_xml_from_xfa, ExtractError, Result, XmlElement};
use std::cell::OnceCell;
use std::fmt;
use std::io::Read;
use std::path::Path;

// ── FormKind ─────────────────────────────────────────────────────────────────

/// The Securities and Futures Act notification forms.
///
/// See <https://www.mas.gov.sg/regulation/capital-markets/disclosure-of-interest-in-listed-securities>.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormKind {
    Form1,
    Form2,
    Form3,
    Form4,
    Form5,
    Form6,
    Form7,
}

impl FormKind {
    /// All forms, in numbering order.
    pub const ALL: [FormKind; 7] = [
        FormKind::Form1,
        FormKind::Form2,
        FormKind::Form3,
        FormKind::Form4,
        FormKind::Form5,
        FormKind::Form6,
        FormKind::Form7,
    ];

    /// Look a form up by its number (`1..=7`).
    pub fn from_number(number: u8) -> Option<Self> {
        Self::ALL.get(usize::from(number).checked_sub(1)?).copied()
    }

    /// The form's number.
    pub fn number(self) -> u8 {
        match self {
            FormKind::Form1 => 1,
            FormKind::Form2 => 2,
            FormKind::Form3 => 3,
            FormKind::Form4 => 4,
            FormKind::Form5 => 5,
            FormKind::Form6 => 6,
            FormKind::Form7 => 7,
        }
    }

    /// Whether this crate maps the form's fields.
    pub fn is_supported(self) -> bool {
        matches!(self, FormKind::Form1)
    }

    /// What the form discloses.
    pub fn purpose(self) -> &'static str {
        match self {
            FormKind::Form1 | FormKind::Form4 => {
                "Interests or changes in interests in the securities of listed issuer"
            }
            FormKind::Form2 => {
                "Interests or changes in interests in the securities of a related corporation \
                 of the listed company"
            }
            FormKind::Form3 => {
                "Changes in percentage level of interests in voting shares of listed \
                 corporation or voting units in listed BT/REIT"
            }
            FormKind::Form5 => {
                "Changes in interests in the voting shares of the trustee-manager or \
                 responsible person"
            }
            FormKind::Form6 => "Interests or changes in interests in the securities of the BT/REIT",
            FormKind::Form7 => {
                "Announcement of Forms 1, 3, 5 and 6 received from directors, CEOs, \
                 substantial shareholders/unitholders and shareholders of unlisted \
                 trustee-manager/responsible person"
            }
        }
    }

    /// Who files the form.
    pub fn filed_by(self) -> &'static [&'static str] {
        match self {
            FormKind::Form1 => &[
                "Director/CEO of listed corporation",
                "Director/CEO of trustee-manager of listed business trust (BT)",
                "Director/CEO of responsible person of listed real estate investment trust (REIT)",
            ],
            FormKind::Form2 => &["Director of listed company incorporated in Singapore"],
            FormKind::Form3 => &[
                "Substantial shareholder of listed corporation",
                "Substantial unitholder of listed BT or REIT",
            ],
            FormKind::Form4 => &["Registered holder of securities in listed issuer"],
            FormKind::Form5 => &[
                "Shareholder of an unlisted trustee-manager of a listed BT",
                "Shareholder of an unlisted responsible person of a listed REIT",
            ],
            FormKind::Form6 => &[
                "Trustee-manager of a listed BT",
                "Responsible person of a listed REIT",
            ],
            FormKind::Form7 => &[
                "Listed corporation",
                "Trustee-manager of listed BT",
                "Responsible person of listed REIT",
            ],
        }
    }

    /// Who the form is addressed to.
    pub fn filed_to(self) -> &'static [&'static str] {
        match self {
            FormKind::Form1 => &[
                "Listed corporation",
                "Trustee-manager of listed BT",
                "Responsible person of listed REIT",
            ],
            FormKind::Form2 => &["Listed company"],
            FormKind::Form3 => &[
                "Listed corporation",
                "Trustee-manager of listed BT",
                "Responsible person and trustee of listed REIT",
            ],
            FormKind::Form4 => &["Person who has a deemed interest in the securities"],
            FormKind::Form5 => &[
                "Trustee-manager of listed BT",
                "Responsible person of listed REIT",
            ],
            FormKind::Form6 => &["Investors via SGXNet announcement (Form 7)"],
            FormKind::Form7 => &["Investors"],
        }
    }
}

impl fmt::Display for FormKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Form {}", self.number())
    }
}

// ── IssuerType ───────────────────────────────────────────────────────────────

/// Corporate structure of the listed issuer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IssuerType {
    Company,
    BusinessTrust,
    RealEstateInvestmentTrust,
    /// A code the form schema does not define, kept verbatim.
    Other(String),
}

impl IssuerType {
    /// Map the form's raw issuer code (`"1"`, `"2"`, `"3"`).
    pub fn from_code(code: &str) -> Self {
        match code {
            "1" => IssuerType::Company,
            "2" => IssuerType::BusinessTrust,
            "3" => IssuerType::RealEstateInvestmentTrust,
            other => IssuerType::Other(other.to_owned()),
        }
    }

    pub fn label(&self) -> &str {
        match self {
            IssuerType::Company => "Company/Corporation",
            IssuerType::BusinessTrust => "Registered/Recognised Business Trust",
            IssuerType::RealEstateInvestmentTrust => "Real Estate Investment Trust",
            IssuerType::Other(code) => code,
        }
    }
}

impl fmt::Display for IssuerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ── NotificationForm ─────────────────────────────────────────────────────────

/// A notification form of any kind.
///
/// Only Form 1 has a field mapping. The other variants carry no data and every
/// accessor on them returns [`ExtractError::UnsupportedForm`].
#[derive(Debug)]
pub enum NotificationForm {
    Form1(Form1),
    Form2,
    Form3,
    Form4,
    Form5,
    Form6,
    Form7,
}

impl NotificationForm {
    /// Build a form of `kind` over an already extracted datasets tree.
    pub fn from_xml(kind: FormKind, root: XmlElement) -> Self {
        match kind {
            FormKind::Form1 => NotificationForm::Form1(Form1::new(root)),
            FormKind::Form2 => NotificationForm::Form2,
            FormKind::Form3 => NotificationForm::Form3,
            FormKind::Form4 => NotificationForm::Form4,
            FormKind::Form5 => NotificationForm::Form5,
            FormKind::Form6 => NotificationForm::Form6,
            FormKind::Form7 => NotificationForm::Form7,
        }
    }

    /// Read a PDF from `reader` and build a form of `kind` from its XFA data.
    ///
    /// Extraction failures are returned before the form kind is looked at, and
    /// a PDF without a datasets packet is [`ExtractError::NoXfaDatasets`].
    pub fn from_reader<R: Read>(kind: FormKind, reader: R) -> Result<Self> {
        let root = extract_xml_from_xfa(reader)?.ok_or(ExtractError::NoXfaDatasets)?;
        Ok(Self::from_xml(kind, root))
    }

    /// Open the PDF at `path` and build a form of `kind` from its XFA data.
    pub fn from_path<P: AsRef<Path>>(kind: FormKind, path: P) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(kind, std::io::BufReader::new(file))
    }

    pub fn kind(&self) -> FormKind {
        match self {
            NotificationForm::Form1(_) => FormKind::Form1,
            NotificationForm::Form2 => FormKind::Form2,
            NotificationForm::Form3 => FormKind::Form3,
            NotificationForm::Form4 => FormKind::Form4,
            NotificationForm::Form5 => FormKind::Form5,
            NotificationForm::Form6 => FormKind::Form6,
            NotificationForm::Form7 => FormKind::Form7,
        }
    }

    /// The Form 1 record, if this is one.
    pub fn as_form1(&self) -> Option<&Form1> {
        match self {
            NotificationForm::Form1(form) => Some(form),
            _ => None,
        }
    }

    fn mapped(&self) -> Result<&Form1> {
        self.as_form1()
            .ok_or_else(|| ExtractError::UnsupportedForm(self.kind()))
    }

    pub fn issuer_name(&self) -> Result<&str> {
        Ok(self.mapped()?.issuer_name())
    }

    pub fn issuer_type(&self) -> Result<&IssuerType> {
        Ok(self.mapped()?.issuer_type())
    }

    pub fn insider_name(&self) -> Result<&str> {
        Ok(self.mapped()?.insider_name())
    }

    pub fn insider_title(&self) -> Result<&str> {
        Ok(self.mapped()?.insider_title())
    }

    pub fn trade_date(&self) -> Result<&str> {
        Ok(self.mapped()?.trade_date())
    }

    pub fn securities_before(&self) -> Result<Option<&SecurityHolding>> {
        self.mapped()?.securities_before()
    }

    pub fn securities_after(&self) -> Result<Option<&SecurityHolding>> {
        self.mapped()?.securities_after()
    }

    /// Amount of consideration in SGD.
    pub fn amt_consideration(&self) -> Result<f64> {
        Ok(self.mapped()?.amt_consideration())
    }

    /// Render every field, see [`Form1::render`].
    pub fn render(&self) -> Result<String> {
        self.mapped()?.render()
    }
}

// ── Form 1 ───────────────────────────────────────────────────────────────────

/// Which part of Form 1 carries the filing's data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationSection {
    /// Part II: the director notifies existing interests at appointment time.
    /// Nothing was traded.
    AppointmentTime,
    /// Part III: the director reports an acquisition or disposal.
    Transaction,
}

const INSIDER_TITLE: &str = "Director/CEO";

const NOTIFYING_AT_APPT_TIME: &str = "Form1/Part1/notifyingAtApptTime";
const ISSUER_NAME: &str = "Form1/Part1/listedIssuer/name";
const ISSUER_TYPE: &str = "Form1/Part1/listedIssuer/type";
const DIRECTOR_NAME: &str = "Form1/Part1/nameDirector";
const APPOINTMENT_DATE: &str = "Form1/Part2/dateAppointmentDirectorLI";
// sic: the form schema spells it this way
const ACQUISITION_DATE: &str = "Form1/Part3/Transaction/dateAquisition";
const CONSIDERATION: &str = "Form1/Part3/Transaction/amtConsideration";

const PART_2_TOTALS: &str = "xfa:data/SFA289/Form1/Part2/T1";
const PART_3_TRANSACTION: &str = "xfa:data/SFA289/Form1/Part3/Transaction";

/// Part II totals table, relative to [`PART_2_TOTALS`].
const PART_2_FIELDS: [(SecurityType, &str); 8] = [
    (SecurityType::OrdinaryShares, "ord/num/tot"),
    (SecurityType::OtherShares, "othx/tot"),
    (SecurityType::RightsOptionsWarrants, "opt/num/tot"),
    (SecurityType::Debentures, "deb/amt/tot"),
    (SecurityType::RightsOptionsOfDebentures, "rDeb/amt/tot"),
    (SecurityType::Contracts, "con/amt/tot"),
    (SecurityType::ParticipatoryInterests, "opt/part/tot"),
    (SecurityType::Others, "opt/oth/tot"),
];

/// Part III tables as `(type, table, field)`, read at
/// `{table}/before/{field}` and `{table}/after/{field}` relative to
/// [`PART_3_TRANSACTION`].
const PART_3_FIELDS: [(SecurityType, &str, &str); 8] = [
    (SecurityType::OrdinaryShares, "T1Ord", "num/tot"),
    (SecurityType::OtherShares, "T2Othx", "tot"),
    (SecurityType::RightsOptionsWarrants, "T3Opt", "num/tot"),
    (SecurityType::Debentures, "T4Deb", "amt/tot"),
    (SecurityType::RightsOptionsOfDebentures, "T5RDeb", "amt/tot"),
    (SecurityType::Contracts, "T6Con", "amt/tot"),
    (SecurityType::ParticipatoryInterests, "T7Part", "part/tot"),
    (SecurityType::Others, "T8Oth", "oth/tot"),
];

/// Form 1: a director's or CEO's interests in the securities of the listed
/// issuer.
///
/// Fields are read from the XFA datasets tree on first access and cached, so
/// repeated calls return the same value without walking the tree again. The
/// record is not `Sync`; use one instance per thread.
///
/// ```
/// use insiderforms::{Form1, NotificationSection, XmlElement};
///
/// let xml = r#"<xfa:datasets xmlns:xfa="http://www.xfa.org/schema/xfa-data/1.0/">
///   <xfa:data><SFA289><Form1>
///     <Part1>
///       <notifyingAtApptTime>1</notifyingAtApptTime>
///       <nameDirector>Tan Ah Kow</nameDirector>
///     </Part1>
///     <Part2><dateAppointmentDirectorLI>2023-05-02</dateAppointmentDirectorLI></Part2>
///   </Form1></SFA289></xfa:data>
/// </xfa:datasets>"#;
///
/// let form = Form1::new(XmlElement::parse(xml).unwrap());
/// assert_eq!(form.section(), NotificationSection::AppointmentTime);
/// assert_eq!(form.insider_name(), "Tan Ah Kow");
/// assert_eq!(form.trade_date(), "2023-05-02");
/// assert_eq!(form.amt_consideration(), 0.0);
/// ```
#[derive(Debug)]
pub struct Form1 {
    xml: XmlElement,
    section: NotificationSection,
    issuer_name: OnceCell<String>,
    issuer_type: OnceCell<IssuerType>,
    insider_name: OnceCell<String>,
    trade_date: OnceCell<String>,
    part_2_securities: OnceCell<Option<SecurityHolding>>,
    part_3_securities: OnceCell<(Option<SecurityHolding>, Option<SecurityHolding>)>,
    amt_consideration: OnceCell<f64>,
}

impl Form1 {
    /// Build a record over an extracted datasets tree.
    ///
    /// The appointment-time flag is read here and fixes which part of the
    /// form every other field comes from.
    pub fn new(xml: XmlElement) -> Self {
        let section = if xml.get_text(NOTIFYING_AT_APPT_TIME).trim() == "1" {
            NotificationSection::AppointmentTime
        } else {
            NotificationSection::Transaction
        };
        log::debug!("Form 1 data is in {section:?} section");

        Self {
            xml,
            section,
            issuer_name: OnceCell::new(),
            issuer_type: OnceCell::new(),
            insider_name: OnceCell::new(),
            trade_date: OnceCell::new(),
            part_2_securities: OnceCell::new(),
            part_3_securities: OnceCell::new(),
            amt_consideration: OnceCell::new(),
        }
    }

    /// Read a PDF from `reader` and build a record from its XFA data.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let root = extract_xml_from_xfa(reader)?.ok_or(ExtractError::NoXfaDatasets)?;
        Ok(Self::new(root))
    }

    /// Open the PDF at `path` and build a record from its XFA data.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(std::io::BufReader::new(file))
    }

    /// The datasets tree this record reads from.
    pub fn xml(&self) -> &XmlElement {
        &self.xml
    }

    pub fn section(&self) -> NotificationSection {
        self.section
    }

    /// `true` if the director is notifying interests at the time of
    /// appointment (Part II), `false` for a transaction (Part III).
    pub fn is_notifying_at_appt_time(&self) -> bool {
        self.section == NotificationSection::AppointmentTime
    }

    pub fn issuer_name(&self) -> &str {
        self.issuer_name
            .get_or_init(|| self.xml.get_text(ISSUER_NAME).to_owned())
    }

    pub fn issuer_type(&self) -> &IssuerType {
        self.issuer_type
            .get_or_init(|| IssuerType::from_code(self.xml.get_text(ISSUER_TYPE)))
    }

    pub fn insider_name(&self) -> &str {
        self.insider_name
            .get_or_init(|| self.xml.get_text(DIRECTOR_NAME).to_owned())
    }

    pub fn insider_title(&self) -> &str {
        INSIDER_TITLE
    }

    /// Appointment date (Part II) or acquisition date (Part III), verbatim.
    pub fn trade_date(&self) -> &str {
        self.trade_date.get_or_init(|| {
            let path = match self.section {
                NotificationSection::AppointmentTime => APPOINTMENT_DATE,
                NotificationSection::Transaction => ACQUISITION_DATE,
            };
            self.xml.get_text(path).to_owned()
        })
    }

    /// Holdings before the transaction, or `None` when the section carrying
    /// them is absent from the form.
    pub fn securities_before(&self) -> Result<Option<&SecurityHolding>> {
        match self.section {
            NotificationSection::AppointmentTime => Ok(self.part_2_securities()?.as_ref()),
            NotificationSection::Transaction => Ok(self.part_3_securities()?.0.as_ref()),
        }
    }

    /// Holdings after the transaction.
    ///
    /// A notification at appointment time reports existing interests only, so
    /// this is the same holding as [`securities_before`](Self::securities_before).
    pub fn securities_after(&self) -> Result<Option<&SecurityHolding>> {
        match self.section {
            NotificationSection::AppointmentTime => self.securities_before(),
            NotificationSection::Transaction => Ok(self.part_3_securities()?.1.as_ref()),
        }
    }

    /// Amount of consideration paid or received, in SGD.
    ///
    /// Zero at appointment time. For a transaction the amount is parsed
    /// leniently and an unreadable amount is also zero.
    pub fn amt_consideration(&self) -> f64 {
        *self.amt_consideration.get_or_init(|| match self.section {
            NotificationSection::AppointmentTime => 0.0,
            NotificationSection::Transaction => {
                parse_money(self.xml.get_text(CONSIDERATION), Some(0.0)).unwrap_or(0.0)
            }
        })
    }

    /// All fields as `LABEL: value` lines.
    pub fn render(&self) -> Result<String> {
        Ok(format!(
            "TRADE DATE: {}\n\
             ISSUER NAME: {}\n\
             ISSUER TYPE: {}\n\
             INSIDER TITLE: {}\n\
             INSIDER NAME: {}\n\
             AMT SECURITIES (BEF): {}\n\
             AMT SECURITIES (AFT): {}\n\
             AMT CONSIDERATION (PAID/RECV): {}\n\
             NOTIFYING AT TIME OF APPT: {}",
            self.trade_date(),
            self.issuer_name(),
            self.issuer_type(),
            self.insider_title(),
            self.insider_name(),
            format_holding(self.securities_before()?),
            format_holding(self.securities_after()?),
            self.amt_consideration(),
            self.is_notifying_at_appt_time(),
        ))
    }

    // ── Private: securities tables ───────────────────────────────────────────

    fn part_2_securities(&self) -> Result<&Option<SecurityHolding>> {
        get_or_try_init(&self.part_2_securities, || {
            let totals = match self.xml.find_ns(PART_2_TOTALS, XFA_NAMESPACES) {
                Some(node) => node,
                None => return Ok(None),
            };
            let fields = PART_2_FIELDS
                .iter()
                .map(|&(security, path)| (security, path.to_owned()));
            read_holding(totals, fields).map(Some)
        })
    }

    fn part_3_securities(&self) -> Result<&(Option<SecurityHolding>, Option<SecurityHolding>)> {
        get_or_try_init(&self.part_3_securities, || {
            let transaction = match self.xml.find_ns(PART_3_TRANSACTION, XFA_NAMESPACES) {
                Some(node) => node,
                None => return Ok((None, None)),
            };
            let before = PART_3_FIELDS
                .iter()
                .map(|&(security, table, field)| (security, format!("{table}/before/{field}")));
            let after = PART_3_FIELDS
                .iter()
                .map(|&(security, table, field)| (security, format!("{table}/after/{field}")));
            Ok((
                Some(read_holding(transaction, before)?),
                Some(read_holding(transaction, after)?),
            ))
        })
    }
}

/// Collect the counts under `node`, skipping fields with no text.
fn read_holding<I>(node: &XmlElement, fields: I) -> Result<SecurityHolding>
where
    I: IntoIterator<Item = (SecurityType, String)>,
{
    let mut holding = SecurityHolding::new();
    for (security, path) in fields {
        let text = node.get_text(&path);
        if text.is_empty() {
            continue;
        }
        holding.insert(security, parse_count(&path, text)?);
    }
    Ok(holding)
}

/// Parse a count such as `"1,250,000"`.
fn parse_count(field: &str, text: &str) -> Result<u64> {
    text.replace(',', "")
        .trim()
        .parse()
        .map_err(|source| ExtractError::InvalidCount {
            field: field.to_owned(),
            value: text.to_owned(),
            source,
        })
}

/// Fallible [`OnceCell::get_or_init`]; a failed `init` leaves the cell empty.
fn get_or_try_init<T, F>(cell: &OnceCell<T>, init: F) -> Result<&T>
where
    F: FnOnce() -> Result<T>,
{
    if let Some(value) = cell.get() {
        return Ok(value);
    }
    let value = init()?;
    Ok(cell.get_or_init(|| value))
}
