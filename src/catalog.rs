//! Fixed answer sets for the quiz and registration screens.

pub const MOODS: &[&str] = &[
    "Confident",
    "Relaxed",
    "Romantic",
    "Energized",
    "Mysterious",
    "Elegant",
    "Cozy",
];

pub const OCCASIONS: &[&str] = &[
    "Work/Office",
    "Formal Event",
    "Date Night",
    "Casual Outing",
    "Wedding",
    "Gym/Sport",
    "Home Relaxation",
];

pub const WEATHER: &[&str] = &["Warm", "Cold", "Humid", "Dry"];

pub const TIMES: &[&str] = &["Morning", "Afternoon", "Evening", "Night"];

pub const GENDERS: &[&str] = &["Female", "Male", "Non-binary", "Unisex Preference"];

pub struct Country {
    pub code: &'static str,
    pub name: &'static str,
    pub currency: &'static str,
}

pub const COUNTRIES: &[Country] = &[
    Country { code: "AE", name: "United Arab Emirates", currency: "AED" },
    Country { code: "AU", name: "Australia", currency: "AUD" },
    Country { code: "BR", name: "Brazil", currency: "BRL" },
    Country { code: "CA", name: "Canada", currency: "CAD" },
    Country { code: "DE", name: "Germany", currency: "EUR" },
    Country { code: "ES", name: "Spain", currency: "EUR" },
    Country { code: "FR", name: "France", currency: "EUR" },
    Country { code: "GB", name: "United Kingdom", currency: "GBP" },
    Country { code: "IN", name: "India", currency: "INR" },
    Country { code: "IT", name: "Italy", currency: "EUR" },
    Country { code: "JP", name: "Japan", currency: "JPY" },
    Country { code: "KR", name: "South Korea", currency: "KRW" },
    Country { code: "SG", name: "Singapore", currency: "SGD" },
    Country { code: "US", name: "United States", currency: "USD" },
];

/// Look up a country by its code; unknown codes fall back to the first entry
/// so screens always have a currency to display.
pub fn country_by_code(code: &str) -> &'static Country {
    COUNTRIES
        .iter()
        .find(|c| c.code == code)
        .unwrap_or(&COUNTRIES[0])
}
