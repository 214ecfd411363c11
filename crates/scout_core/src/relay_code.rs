/// Text the relay slot starts with; the operator replaces it with the code.
pub const CODE_PLACEHOLDER: &str = "ENTER_2FA_CODE_HERE";

/// Digits in a second-factor code.
pub const CODE_LEN: usize = 6;

/// Scans relay slot content for a verification code.
///
/// A line consisting of exactly six digits wins. Any other line that is not
/// the placeholder, an instruction header, or one of `ignored` (the lines the
/// slot was created with) counts if its digits concatenate to exactly six.
pub fn find_code(content: &str, ignored: &[&str]) -> Option<String> {
    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line.len() == CODE_LEN && line.chars().all(|c| c.is_ascii_digit()) {
            return Some(line.to_string());
        }
        if line == CODE_PLACEHOLDER
            || line.starts_with("Instructions:")
            || ignored.iter().any(|ignored| ignored.trim() == line)
        {
            continue;
        }
        let digits: String = line.chars().filter(|c| c.is_ascii_digit()).collect();
        if digits.len() == CODE_LEN {
            return Some(digits);
        }
    }
    None
}
