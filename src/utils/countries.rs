// Static country catalogue for the country-of-residence picker and phone dial codes.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Country {
    pub name: &'static str,
    pub iso2: &'static str,
    pub dial_code: &'static str,
}

const fn c(name: &'static str, iso2: &'static str, dial_code: &'static str) -> Country {
    Country {
        name,
        iso2,
        dial_code,
    }
}

pub const COUNTRIES: &[Country] = &[
    c("Argentina", "AR", "+54"),
    c("Australia", "AU", "+61"),
    c("Austria", "AT", "+43"),
    c("Belgium", "BE", "+32"),
    c("Botswana", "BW", "+267"),
    c("Brazil", "BR", "+55"),
    c("Burundi", "BI", "+257"),
    c("Canada", "CA", "+1"),
    c("China", "CN", "+86"),
    c("Democratic Republic of the Congo", "CD", "+243"),
    c("Denmark", "DK", "+45"),
    c("Egypt", "EG", "+20"),
    c("Ethiopia", "ET", "+251"),
    c("Finland", "FI", "+358"),
    c("France", "FR", "+33"),
    c("Germany", "DE", "+49"),
    c("Ghana", "GH", "+233"),
    c("India", "IN", "+91"),
    c("Ireland", "IE", "+353"),
    c("Israel", "IL", "+972"),
    c("Italy", "IT", "+39"),
    c("Japan", "JP", "+81"),
    c("Kenya", "KE", "+254"),
    c("Malawi", "MW", "+265"),
    c("Mexico", "MX", "+52"),
    c("Morocco", "MA", "+212"),
    c("Mozambique", "MZ", "+258"),
    c("Namibia", "NA", "+264"),
    c("Netherlands", "NL", "+31"),
    c("New Zealand", "NZ", "+64"),
    c("Nigeria", "NG", "+234"),
    c("Norway", "NO", "+47"),
    c("Poland", "PL", "+48"),
    c("Portugal", "PT", "+351"),
    c("Qatar", "QA", "+974"),
    c("Rwanda", "RW", "+250"),
    c("Saudi Arabia", "SA", "+966"),
    c("Singapore", "SG", "+65"),
    c("South Africa", "ZA", "+27"),
    c("South Korea", "KR", "+82"),
    c("South Sudan", "SS", "+211"),
    c("Spain", "ES", "+34"),
    c("Sweden", "SE", "+46"),
    c("Switzerland", "CH", "+41"),
    c("Tanzania", "TZ", "+255"),
    c("Uganda", "UG", "+256"),
    c("United Arab Emirates", "AE", "+971"),
    c("United Kingdom", "GB", "+44"),
    c("United States", "US", "+1"),
    c("Zambia", "ZM", "+260"),
    c("Zimbabwe", "ZW", "+263"),
];

/// Shown when the search box is empty.
pub const TOP_COUNTRIES: &[&str] = &[
    "Uganda",
    "Kenya",
    "Rwanda",
    "Tanzania",
    "United States",
    "United Kingdom",
    "Germany",
    "Canada",
];

/// Look up a country by exact (case-insensitive) name.
pub fn find_country(name: &str) -> Option<&'static Country> {
    let needle = name.trim();
    COUNTRIES.iter().find(|c| c.name.eq_ignore_ascii_case(needle))
}

/// Filter the catalogue for the picker. Empty search returns the curated top list.
pub fn filter_countries(search: &str) -> Vec<&'static Country> {
    let needle = search.trim().to_lowercase();
    if needle.is_empty() {
        return TOP_COUNTRIES.iter().filter_map(|n| find_country(n)).collect();
    }
    COUNTRIES
        .iter()
        .filter(|c| c.name.to_lowercase().contains(&needle))
        .collect()
}

/// Build an E.164-like phone number from a dial code and the locally typed number.
/// Separators and a leading trunk `0` are dropped; a number already starting with `+`
/// is taken as-is.
pub fn compose_phone(dial_code: &str, local: &str) -> String {
    let local = super::validation::normalize_phone(local.trim());
    if local.starts_with('+') {
        return local;
    }
    let local = local.trim_start_matches('0');
    if local.is_empty() {
        return String::new();
    }
    format!("{}{}", dial_code.trim(), local)
}
