//! National document validation
//!
//! Person (CPF, 11 digits) and company (CNPJ, 14 digits) identifiers carry
//! two trailing check digits computed with a weighted modulo-11 scheme.
//! Everything here is pure and runs before any store is touched.

const CPF_LEN: usize = 11;
const CNPJ_LEN: usize = 14;

const CPF_FIRST_WEIGHTS: [u32; 9] = [10, 9, 8, 7, 6, 5, 4, 3, 2];
const CPF_SECOND_WEIGHTS: [u32; 10] = [11, 10, 9, 8, 7, 6, 5, 4, 3, 2];

const CNPJ_FIRST_WEIGHTS: [u32; 12] = [5, 4, 3, 2, 9, 8, 7, 6, 5, 4, 3, 2];
const CNPJ_SECOND_WEIGHTS: [u32; 13] = [6, 5, 4, 3, 2, 9, 8, 7, 6, 5, 4, 3, 2];

/// Strip every non-digit character.
pub fn normalize_digits(raw: &str) -> String {
    raw.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// Validate a person identifier (CPF).
pub fn validate_person_id(raw: &str) -> bool {
    validate_with(raw, CPF_LEN, &CPF_FIRST_WEIGHTS, &CPF_SECOND_WEIGHTS)
}

/// Validate a company identifier (CNPJ).
pub fn validate_company_id(raw: &str) -> bool {
    validate_with(raw, CNPJ_LEN, &CNPJ_FIRST_WEIGHTS, &CNPJ_SECOND_WEIGHTS)
}

/// Render a CPF as `000.000.000-00`. Returns `None` for the wrong length.
pub fn format_person_id(raw: &str) -> Option<String> {
    let d = normalize_digits(raw);
    if d.len() != CPF_LEN {
        return None;
    }
    Some(format!("{}.{}.{}-{}", &d[0..3], &d[3..6], &d[6..9], &d[9..11]))
}

/// Render a CNPJ as `00.000.000/0000-00`. Returns `None` for the wrong length.
pub fn format_company_id(raw: &str) -> Option<String> {
    let d = normalize_digits(raw);
    if d.len() != CNPJ_LEN {
        return None;
    }
    Some(format!(
        "{}.{}.{}/{}-{}",
        &d[0..2],
        &d[2..5],
        &d[5..8],
        &d[8..12],
        &d[12..14]
    ))
}

fn validate_with(raw: &str, len: usize, first: &[u32], second: &[u32]) -> bool {
    let digits: Vec<u32> = raw.chars().filter_map(|c| c.to_digit(10)).collect();
    if digits.len() != len {
        return false;
    }

    // Repeated-digit sequences satisfy the checksum for some lengths but are
    // never issued.
    if digits.iter().all(|d| *d == digits[0]) {
        return false;
    }

    let first_check = check_digit(&digits[..first.len()], first);
    if first_check != digits[first.len()] {
        return false;
    }

    let second_check = check_digit(&digits[..second.len()], second);
    second_check == digits[second.len()]
}

fn check_digit(digits: &[u32], weights: &[u32]) -> u32 {
    let sum: u32 = digits.iter().zip(weights).map(|(d, w)| d * w).sum();
    match sum % 11 {
        0 | 1 => 0,
        r => 11 - r,
    }
}
