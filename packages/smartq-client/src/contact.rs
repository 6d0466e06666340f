//! Email/phone contact targets for OTP verification.

use std::fmt;

/// Where a verification code is delivered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Contact {
    Email(String),
    Phone(String),
}

impl Contact {
    /// Classify raw input: anything containing `@` is an email, otherwise a phone number.
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return None;
        }

        if trimmed.contains('@') {
            Some(Contact::Email(trimmed.to_string()))
        } else {
            Some(Contact::Phone(trimmed.to_string()))
        }
    }

    pub fn value(&self) -> &str {
        match self {
            Contact::Email(v) | Contact::Phone(v) => v,
        }
    }

    pub fn is_email(&self) -> bool {
        matches!(self, Contact::Email(_))
    }

    /// "Email" or "Phone number".
    pub fn label(&self) -> &'static str {
        match self {
            Contact::Email(_) => "Email",
            Contact::Phone(_) => "Phone number",
        }
    }

    /// Display form with the middle hidden.
    ///
    /// Emails keep the first two characters of the local part (`ab***@mail.com`),
    /// phones keep the first three and last two digits (`555****42`).
    pub fn masked(&self) -> String {
        match self {
            Contact::Email(email) => mask_email(email),
            Contact::Phone(phone) => mask_phone(phone),
        }
    }
}

impl fmt::Display for Contact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.value())
    }
}

fn mask_email(email: &str) -> String {
    let Some(at) = email.rfind('@') else {
        return email.to_string();
    };
    let (local, domain) = email.split_at(at);
    let chars: Vec<char> = local.chars().collect();
    // Needs at least one hidden character after the two kept ones.
    if chars.len() < 3 {
        return email.to_string();
    }
    let kept: String = chars.iter().take(2).collect();
    format!("{kept}***{domain}")
}

fn mask_phone(phone: &str) -> String {
    let digits: Vec<char> = phone.chars().filter(char::is_ascii_digit).collect();
    if digits.len() < 6 {
        return phone.to_string();
    }
    let head: String = digits.iter().take(3).collect();
    let tail: String = digits.iter().skip(digits.len() - 2).collect();
    let prefix = if phone.trim_start().starts_with('+') { "+" } else { "" };
    format!("{prefix}{head}****{tail}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse() {
        assert_eq!(
            Contact::parse(" bob@example.com "),
            Some(Contact::Email("bob@example.com".into()))
        );
        assert_eq!(
            Contact::parse("+15550100"),
            Some(Contact::Phone("+15550100".into()))
        );
        assert_eq!(Contact::parse("   "), None);
    }

    #[test]
    fn test_mask_email() {
        let contact = Contact::Email("bobsmith@example.com".into());
        assert_eq!(contact.masked(), "bo***@example.com");
        assert_eq!(Contact::Email("ab@x.io".into()).masked(), "ab@x.io");
    }

    #[test]
    fn test_mask_phone() {
        assert_eq!(Contact::Phone("5551234542".into()).masked(), "555****42");
        assert_eq!(Contact::Phone("+1 555 123 4542".into()).masked(), "+155****42");
        assert_eq!(Contact::Phone("12345".into()).masked(), "12345");
    }

    #[test]
    fn test_labels() {
        assert_eq!(Contact::Email("a@b.c".into()).label(), "Email");
        assert_eq!(Contact::Phone("1".into()).label(), "Phone number");
    }
}
