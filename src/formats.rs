use serde::Serialize;

/// How a layout encodes the zone of the instant it describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Zone {
    /// No zone information; interpreted as UTC.
    Naive,
    /// A literal trailing `Z`.
    Utc,
    /// Numeric offset such as `-0700`, `-07:00` or `-07`.
    Offset,
    /// Either a literal `Z` or a numeric `-07:00` offset.
    OffsetOrUtc,
    /// Zone abbreviation such as `MST`. Carries no offset.
    Named,
}

/// Finest unit a layout writes out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Precision {
    Minute,
    Second,
    Milli,
    Micro,
    Nano,
}

/// One catalog entry.
///
/// `template` is written in reference-instant notation (`Mon Jan 2 15:04:05 MST 2006`,
/// `_2` for a space padded day) and is what partial user input is completed against.
/// `format` is the chrono format used to parse candidates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Layout {
    pub template: &'static str,
    #[serde(skip)]
    pub format: &'static str,
    pub zone: Zone,
    pub precision: Precision,
}

impl Layout {
    const fn new(template: &'static str, format: &'static str, zone: Zone, precision: Precision) -> Self {
        Self { template, format, zone, precision }
    }

    /// True when the layout has no year field and a year must be assumed.
    pub fn is_yearless(&self) -> bool {
        !self.format.contains("%Y") && !self.format.contains("%y")
    }

    /// Number of whitespace separated fields a rendered timestamp occupies.
    pub fn field_count(&self) -> usize {
        self.template.split_whitespace().count()
    }

    /// Position of this layout in [`CATALOG`]. Identical duplicates resolve to the first.
    pub fn priority(&self) -> usize {
        CATALOG.iter().position(|l| l == self).unwrap_or(CATALOG.len())
    }
}

impl std::fmt::Display for Layout {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.template)
    }
}

use Precision::*;
use Zone::*;

/// Ordered catalog of known layouts; the first one that parses a candidate wins.
///
/// Order is significant. Some entries shadow later ones (the lenient fraction
/// accepted after seconds lets `Jan _2 15:04:05` swallow `Jan _2 15:04:05.000`,
/// and the last entry duplicates an earlier one); they are kept so results stay
/// reproducible across files.
pub static CATALOG: [Layout; 40] = [
    Layout::new("2006/01/02 15:04:05.000000", "%Y/%m/%d %H:%M:%S.%6f", Naive, Micro),
    Layout::new("2006-01-02 15:04:05,000000000", "%Y-%m-%d %H:%M:%S,%9f", Naive, Nano),
    Layout::new("2006-01-02 15:04:05.000000", "%Y-%m-%d %H:%M:%S.%6f", Naive, Micro),
    Layout::new("2006/01/02 15:04:05.000", "%Y/%m/%d %H:%M:%S.%3f", Naive, Milli),
    Layout::new("2006-01-02 15:04:05,000", "%Y-%m-%d %H:%M:%S,%3f", Naive, Milli),
    Layout::new("2006-01-02T15:04:05.000000", "%Y-%m-%dT%H:%M:%S.%6f", Naive, Micro),
    Layout::new("2006-01-02T15:04:05.000", "%Y-%m-%dT%H:%M:%S.%3f", Naive, Milli),
    Layout::new("2006-01-02 15:04:05", "%Y-%m-%d %H:%M:%S%.f", Naive, Second),
    Layout::new("2006-01-02T15:04:05Z", "%Y-%m-%dT%H:%M:%S%.fZ", Utc, Second),
    Layout::new("2006-01-02T15:04:05.000Z", "%Y-%m-%dT%H:%M:%S.%3fZ", Utc, Milli),
    Layout::new("2006-01-02T15:04:05.000000Z", "%Y-%m-%dT%H:%M:%S.%6fZ", Utc, Micro),
    Layout::new("2006.01.02 15:04:05.000", "%Y.%m.%d %H:%M:%S.%3f", Naive, Milli),
    Layout::new("Jan 2 15:04:05.000 2006", "%b %e %H:%M:%S.%3f %Y", Naive, Milli),
    Layout::new("02/Jan/2006 15:04:05.000", "%d/%b/%Y %H:%M:%S.%3f", Naive, Milli),
    Layout::new("02/Jan/2006:15:04:05 -0700", "%d/%b/%Y:%H:%M:%S%.f %z", Offset, Second),
    Layout::new("Mon Jan 2 15:04:05 2006", "%a %b %e %H:%M:%S%.f %Y", Naive, Second),
    Layout::new("2 Jan 2006 15:04:05", "%e %b %Y %H:%M:%S%.f", Naive, Second),
    Layout::new("2006-01-02 15:04:05.000+0000", "%Y-%m-%d %H:%M:%S.%3f+0000", Naive, Milli),
    Layout::new("2006-01-02 15:04:05-0700", "%Y-%m-%d %H:%M:%S%.f%z", Offset, Second),
    Layout::new("2006-01-02T15:04:05-07:00", "%Y-%m-%dT%H:%M:%S%.f%:z", Offset, Second),
    Layout::new("2006-01-02T15:04:05.999999999Z07:00", "%Y-%m-%dT%H:%M:%S%.f%:z", OffsetOrUtc, Nano),
    Layout::new("Mon, 02 Jan 2006 15:04:05 MST", "%a, %d %b %Y %H:%M:%S%.f %Z", Named, Second),
    Layout::new("Mon, 02 Jan 2006 15:04:05 -0700", "%a, %d %b %Y %H:%M:%S%.f %z", Offset, Second),
    Layout::new("02 Jan 06 15:04 MST", "%d %b %y %H:%M %Z", Named, Minute),
    Layout::new("02 Jan 06 15:04 -0700", "%d %b %y %H:%M %z", Offset, Minute),
    Layout::new("Monday, 02-Jan-06 15:04:05 MST", "%A, %d-%b-%y %H:%M:%S%.f %Z", Named, Second),
    Layout::new("Mon Jan _2 15:04:05 2006", "%a %b %e %H:%M:%S%.f %Y", Naive, Second),
    Layout::new("Mon Jan _2 15:04:05 MST 2006", "%a %b %e %H:%M:%S%.f %Z %Y", Named, Second),
    Layout::new("Mon Jan 02 15:04:05 -0700 2006", "%a %b %d %H:%M:%S%.f %z %Y", Offset, Second),
    Layout::new("Jan _2 15:04:05", "%b %e %H:%M:%S%.f", Naive, Second),
    Layout::new("Jan _2 15:04:05.000", "%b %e %H:%M:%S.%3f", Naive, Milli),
    Layout::new("Jan _2 15:04:05.000000", "%b %e %H:%M:%S.%6f", Naive, Micro),
    Layout::new("Jan _2 15:04:05.000000000", "%b %e %H:%M:%S.%9f", Naive, Nano),
    Layout::new("Jan 02 15:04:05", "%b %d %H:%M:%S%.f", Naive, Second),
    Layout::new("2006-01-02 15:04:05.999999-07", "%Y-%m-%d %H:%M:%S%.f%#z", Offset, Micro),
    Layout::new("20060102150405", "%Y%m%d%H%M%S%.f", Naive, Second),
    Layout::new("20060102150405-0700", "%Y%m%d%H%M%S%.f%z", Offset, Second),
    Layout::new("2006-01-02 15:04:05.999999999 -0700", "%Y-%m-%d %H:%M:%S%.f %z", Offset, Nano),
    Layout::new("Jan 2 15:04:05", "%b %e %H:%M:%S%.f", Naive, Second),
    Layout::new("Jan _2 15:04:05", "%b %e %H:%M:%S%.f", Naive, Second),
];

/// Looks a layout up by its reference template.
pub fn by_template(template: &str) -> Option<&'static Layout> {
    CATALOG.iter().find(|l| l.template == template)
}
