use std::collections::BTreeMap;
use std::fmt;

// ── SecurityType ─────────────────────────────────────────────────────────────

/// Category of security an insider can hold, as laid out in the notification
/// forms' securities tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SecurityType {
    OrdinaryShares,
    OtherShares,
    RightsOptionsWarrants,
    Debentures,
    RightsOptionsOfDebentures,
    Contracts,
    ParticipatoryInterests,
    Others,
}

impl SecurityType {
    /// All categories, in form order.
    pub const ALL: [SecurityType; 8] = [
        SecurityType::OrdinaryShares,
        SecurityType::OtherShares,
        SecurityType::RightsOptionsWarrants,
        SecurityType::Debentures,
        SecurityType::RightsOptionsOfDebentures,
        SecurityType::Contracts,
        SecurityType::ParticipatoryInterests,
        SecurityType::Others,
    ];

    /// Row number of the category in the forms' tables (1-based).
    pub fn code(self) -> u8 {
        match self {
            SecurityType::OrdinaryShares => 1,
            SecurityType::OtherShares => 2,
            SecurityType::RightsOptionsWarrants => 3,
            SecurityType::Debentures => 4,
            SecurityType::RightsOptionsOfDebentures => 5,
            SecurityType::Contracts => 6,
            SecurityType::ParticipatoryInterests => 7,
            SecurityType::Others => 8,
        }
    }

    /// Human-readable label.
    pub fn label(self) -> &'static str {
        match self {
            SecurityType::OrdinaryShares => "Ordinary shares",
            SecurityType::OtherShares => "Other shares",
            SecurityType::RightsOptionsWarrants => "Rights/Options/Warrants",
            SecurityType::Debentures => "Debentures",
            SecurityType::RightsOptionsOfDebentures => "Rights/Options over debentures",
            SecurityType::Contracts => "Contracts",
            SecurityType::ParticipatoryInterests => "Participatory interests",
            SecurityType::Others => "Others",
        }
    }
}

impl fmt::Display for SecurityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ── SecurityHolding ──────────────────────────────────────────────────────────

/// Number of securities held, per category.
///
/// A category is present only when the form reported a value for it; a
/// missing key means "not reported", which is not the same as zero.
pub type SecurityHolding = BTreeMap<SecurityType, u64>;

/// Render a holding one category per line, or `None` when the owning section
/// was absent from the form.
///
/// ```
/// use insiderforms::{format_holding, SecurityHolding, SecurityType};
///
/// let mut h = SecurityHolding::new();
/// h.insert(SecurityType::OrdinaryShares, 1_000);
/// assert_eq!(format_holding(Some(&h)), "{\n  Ordinary shares: 1000,\n}");
/// assert_eq!(format_holding(Some(&SecurityHolding::new())), "{}");
/// assert_eq!(format_holding(None), "None");
/// ```
pub fn format_holding(holding: Option<&SecurityHolding>) -> String {
    match holding {
        None => "None".into(),
        Some(h) if h.is_empty() => "{}".into(),
        Some(h) => {
            let mut out = String::from("{\n");
            for (security, count) in h {
                out.push_str(&format!("  {security}: {count},\n"));
            }
            out.push('}');
            out
        }
    }
}
