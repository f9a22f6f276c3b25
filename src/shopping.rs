//! Retailer search-link construction and price formatting. Pure string work,
//! no network.

use reqwest::Url;

fn search_url(base: &str, params: &[(&str, &str)]) -> String {
    match Url::parse_with_params(base, params) {
        Ok(url) => url.into(),
        Err(_) => base.to_string(),
    }
}

/// Google "I'm feeling lucky" search, which lands on the brand's own site.
pub fn brand_official_url(brand: &str, product_name: &str) -> String {
    let query = format!("{} {} official website", brand, product_name);
    search_url(
        "https://www.google.com/search",
        &[("q", query.as_str()), ("btnI", "1")],
    )
}

pub fn flipkart_url(brand: &str, product_name: &str) -> String {
    let query = format!("{} {} perfume", brand, product_name);
    search_url("https://www.flipkart.com/search", &[("q", &query)])
}

pub fn amazon_url(brand: &str, product_name: &str) -> String {
    let query = format!("{} {} perfume", brand, product_name);
    search_url("https://www.amazon.in/s", &[("k", &query)])
}

/// Render `1234.5` as `USD 1,234.50`.
pub fn format_price(amount: f64, currency_code: &str) -> String {
    let negative = amount < 0.0;
    let cents = (amount.abs() * 100.0).round() as u64;
    let whole = cents / 100;
    let fraction = cents % 100;

    let digits = whole.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }

    let sign = if negative { "-" } else { "" };
    format!("{currency_code} {sign}{grouped}.{fraction:02}")
}
