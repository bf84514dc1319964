//! Colors and test descriptions handed to the rendering layer.

use crate::measurement::Status;

use std::collections::HashMap;

/// Palette of the ooni-components theme.
pub mod palette {
    pub const BASE: &str = "#0588CB";
    pub const GRAY3: &str = "#dee2e6";
    pub const GRAY6: &str = "#868e96";
    pub const GREEN8: &str = "#2f9e44";
    pub const RED7: &str = "#f03e3e";
    pub const YELLOW9: &str = "#e67700";
    pub const VIOLET8: &str = "#7048e8";
    pub const CYAN6: &str = "#15aabf";
    pub const INDIGO5: &str = "#5c7cfa";
    pub const PINK6: &str = "#e64980";
    pub const TEAL7: &str = "#0ca678";
}

/// Page color for each measurement status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageColors {
    pub default: String,
    pub anomaly: String,
    pub reachable: String,
    pub error: String,
    pub down: String,
    pub confirmed: String,
}

impl Default for PageColors {
    fn default() -> Self {
        Self {
            default: palette::BASE.to_string(),
            anomaly: palette::YELLOW9.to_string(),
            reachable: palette::GREEN8.to_string(),
            error: palette::GRAY6.to_string(),
            down: palette::GRAY6.to_string(),
            confirmed: palette::RED7.to_string(),
        }
    }
}

impl PageColors {
    pub fn for_status(&self, status: Status) -> &str {
        match status {
            Status::Default => &self.default,
            Status::Anomaly => &self.anomaly,
            Status::Reachable => &self.reachable,
            Status::Error => &self.error,
            Status::Down => &self.down,
            Status::Confirmed => &self.confirmed,
        }
    }
}

/// Colors of the app statistics chart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChartColors {
    pub reference: String,
    pub value: String,
}

impl Default for ChartColors {
    fn default() -> Self {
        Self {
            reference: palette::GRAY3.to_string(),
            value: palette::GREEN8.to_string(),
        }
    }
}

/// Display information about a test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestMetadata {
    pub name: String,
    pub group_name: String,
    pub color: String,
    pub info: String,
}

/// Lookup table from test name to [`TestMetadata`].
#[derive(Debug, Clone)]
pub struct TestCatalog {
    tests: HashMap<String, TestMetadata>,
}

// (test_name, display name, group, info slug)
const KNOWN_TESTS: &[(&str, &str, TestGroup, &str)] = &[
    ("web_connectivity", "Web Connectivity Test", TestGroup::Websites, "web-connectivity"),
    ("http_invalid_request_line", "HTTP Invalid Request Line Test", TestGroup::Middleboxes, "http-invalid-request-line"),
    ("http_header_field_manipulation", "HTTP Header Field Manipulation Test", TestGroup::Middleboxes, "http-header-field-manipulation"),
    ("ndt", "NDT Speed Test", TestGroup::Performance, "ndt"),
    ("dash", "DASH Video Streaming Test", TestGroup::Performance, "dash"),
    ("whatsapp", "WhatsApp Test", TestGroup::InstantMessaging, "whatsapp"),
    ("facebook_messenger", "Facebook Messenger Test", TestGroup::InstantMessaging, "facebook-messenger"),
    ("telegram", "Telegram Test", TestGroup::InstantMessaging, "telegram"),
    ("signal", "Signal Test", TestGroup::InstantMessaging, "signal"),
    ("psiphon", "Psiphon Test", TestGroup::Circumvention, "psiphon"),
    ("tor", "Tor Test", TestGroup::Circumvention, "tor"),
    ("riseupvpn", "RiseupVPN Test", TestGroup::Circumvention, "riseupvpn"),
    ("dnscheck", "DNS Check", TestGroup::Experimental, "dnscheck"),
    ("stunreachability", "STUN Reachability", TestGroup::Experimental, "stun-reachability"),
];

#[derive(Debug, Clone, Copy)]
enum TestGroup {
    Websites,
    InstantMessaging,
    Middleboxes,
    Performance,
    Circumvention,
    Experimental,
    Legacy,
}

impl TestGroup {
    fn name(self) -> &'static str {
        match self {
            TestGroup::Websites => "Websites",
            TestGroup::InstantMessaging => "Instant Messaging",
            TestGroup::Middleboxes => "Middleboxes",
            TestGroup::Performance => "Performance",
            TestGroup::Circumvention => "Circumvention",
            TestGroup::Experimental => "Experimental",
            TestGroup::Legacy => "Legacy",
        }
    }

    fn color(self) -> &'static str {
        match self {
            TestGroup::Websites => palette::INDIGO5,
            TestGroup::InstantMessaging => palette::CYAN6,
            TestGroup::Middleboxes => palette::VIOLET8,
            TestGroup::Performance => palette::PINK6,
            TestGroup::Circumvention => palette::TEAL7,
            TestGroup::Experimental | TestGroup::Legacy => palette::GRAY6,
        }
    }
}

impl Default for TestCatalog {
    fn default() -> Self {
        let tests = KNOWN_TESTS
            .iter()
            .map(|(id, name, group, slug)| {
                (
                    id.to_string(),
                    TestMetadata {
                        name: name.to_string(),
                        group_name: group.name().to_string(),
                        color: group.color().to_string(),
                        info: format!("https://ooni.org/nettest/{}/", slug),
                    },
                )
            })
            .collect();

        Self { tests }
    }
}

impl TestCatalog {
    pub fn contains(&self, test_name: &str) -> bool {
        self.tests.contains_key(test_name)
    }

    /// Metadata for `test_name`, or a legacy entry named after the test.
    pub fn lookup(&self, test_name: &str) -> TestMetadata {
        self.tests.get(test_name).cloned().unwrap_or_else(|| TestMetadata {
            name: test_name.to_string(),
            group_name: TestGroup::Legacy.name().to_string(),
            color: TestGroup::Legacy.color().to_string(),
            info: "https://ooni.org/nettest/".to_string(),
        })
    }
}

/// Everything the pages need to pick colors and label tests.
#[derive(Debug, Clone, Default)]
pub struct Theme {
    pub page_colors: PageColors,
    pub chart: ChartColors,
    pub tests: TestCatalog,
}
