// ============================================================================
// String Case Conversion Helpers
// ============================================================================

//! Identifier case conversion used by the template helpers.
//!
//! | Input            | snake              | pascal          | camel           |
//! |------------------|--------------------|-----------------|-----------------|
//! | "order-line"     | "order_line"       | "OrderLine"     | "orderLine"     |
//! | "HTTPRequest"    | "http_request"     | "HttpRequest"   | "httpRequest"   |
//! | "customer id"    | "customer_id"      | "CustomerId"    | "customerId"    |

pub fn to_snake_case(s: &str) -> String {
    split_words(s).join("_")
}

pub fn to_kebab_case(s: &str) -> String {
    split_words(s).join("-")
}

pub fn to_pascal_case(s: &str) -> String {
    split_words(s).iter().map(|w| capitalize(w)).collect()
}

pub fn to_camel_case(s: &str) -> String {
    let mut words = split_words(s).into_iter();
    let Some(first) = words.next() else {
        return String::new();
    };
    words.fold(first, |mut out, w| {
        out.push_str(&capitalize(&w));
        out
    })
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => {
            let mut out = String::new();
            out.extend(first.to_uppercase());
            out.push_str(chars.as_str());
            out
        }
        None => String::new(),
    }
}

/// Split an identifier into lowercase words.
///
/// Separators (`_`, `-`, `.`, whitespace) always split; so does a
/// lower→upper transition (`myApp`) and the end of an acronym
/// (`HTTPServer` → `http`, `server`).
fn split_words(input: &str) -> Vec<String> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut chars = input.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '_' || c == '-' || c == '.' || c.is_whitespace() {
            if !current.is_empty() {
                words.push(current.to_lowercase());
                current.clear();
            }
            continue;
        }

        current.push(c);
        if let Some(&next) = chars.peek() {
            let camel = (c.is_lowercase() || c.is_ascii_digit()) && next.is_uppercase();
            let acronym_end = c.is_uppercase()
                && next.is_uppercase()
                && chars.clone().nth(1).is_some_and(char::is_lowercase);
            if camel || acronym_end {
                words.push(current.to_lowercase());
                current.clear();
            }
        }
    }

    if !current.is_empty() {
        words.push(current.to_lowercase());
    }
    words
}
