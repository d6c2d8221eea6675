//! Input format checks applied before any store is touched

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref TOOL_NAME: Regex = Regex::new(r"^[A-Za-z_][A-Za-z0-9_.:\-]{0,63}$").unwrap();
    static ref EMAIL: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    static ref AADHAAR: Regex = Regex::new(r"^\d{12}$").unwrap();
    static ref OTP_CODE: Regex = Regex::new(r"^\d{6}$").unwrap();
    static ref PAN: Regex = Regex::new(r"^[A-Z]{5}[0-9]{4}[A-Z]$").unwrap();
    static ref PERSON_NAME: Regex = Regex::new(r"^[a-zA-Z ]{2,50}$").unwrap();
    static ref RUPEE_AMOUNT: Regex =
        Regex::new(r"(?i)^(?:₹|rs\.?|inr)?\s*(\d[\d,]*(?:\.\d+)?)\s*(?:/-)?$").unwrap();
}

/// Names the model may see and call.
pub fn is_valid_tool_name(name: &str) -> bool {
    TOOL_NAME.is_match(name)
}

pub fn is_valid_email(email: &str) -> bool {
    EMAIL.is_match(email)
}

pub fn is_valid_aadhaar(aadhaar: &str) -> bool {
    AADHAAR.is_match(aadhaar)
}

pub fn is_valid_otp(code: &str) -> bool {
    OTP_CODE.is_match(code)
}

pub fn is_valid_pan(pan: &str) -> bool {
    PAN.is_match(pan)
}

pub fn is_valid_person_name(name: &str) -> bool {
    PERSON_NAME.is_match(name)
}

/// A single rupee amount such as "5,00,000", "₹5,00,000.50" or "Rs. 500000".
/// Anything else (units, exponents, extra numbers) is rejected.
pub fn parse_rupee_amount(text: &str) -> Option<f64> {
    let caps = RUPEE_AMOUNT.captures(text.trim())?;
    caps[1].replace(',', "").parse().ok()
}

/// Keep the first two and last three digits of a mobile number.
pub fn mask_mobile(mobile: &str) -> String {
    let digits: Vec<char> = mobile.chars().collect();
    if digits.len() <= 5 {
        return "*".repeat(digits.len());
    }

    let head: String = digits[..2].iter().collect();
    let tail: String = digits[digits.len() - 3..].iter().collect();
    format!("{}*****{}", head, tail)
}

/// Truncate on a char boundary.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
