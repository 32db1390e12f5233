//! Identifier conversions.
//!
//! Every generated name (record, field, JSON key, column, table, route
//! segment) is a pure function of the declared name. Declared names may be
//! written in any common casing: `invoice_line`, `invoiceLine`,
//! `InvoiceLine` and `invoice-line` all produce the same identifiers.

/// Words that Go spells in full capitals when they appear in an identifier.
const GO_INITIALISMS: &[&str] = &[
    "api", "html", "http", "https", "id", "ip", "json", "sql", "ui", "uri", "url", "uuid", "xml",
];

/// Split an identifier into lowercase words.
///
/// Word boundaries are separators (`_`, `-`, whitespace), lower→upper
/// transitions (`myApp`) and the end of an acronym (`HTTPServer`).
pub fn split_words(input: &str) -> Vec<String> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut chars = input.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '_' || c == '-' || c.is_whitespace() {
            if !current.is_empty() {
                words.push(current.to_lowercase());
                current.clear();
            }
            continue;
        }

        if let Some(&next) = chars.peek() {
            if (c.is_lowercase() || c.is_ascii_digit()) && next.is_uppercase() {
                current.push(c);
                words.push(current.to_lowercase());
                current.clear();
                continue;
            }

            // "HTTPServer" → "HTTP" + "Server"
            if c.is_uppercase()
                && next.is_uppercase()
                && chars.clone().nth(1).is_some_and(|n| n.is_lowercase())
            {
                current.push(c);
                words.push(current.to_lowercase());
                current.clear();
                continue;
            }
        }

        current.push(c);
    }

    if !current.is_empty() {
        words.push(current.to_lowercase());
    }

    words
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// `invoice_line` → `invoice_line`
pub fn to_snake_case(input: &str) -> String {
    split_words(input).join("_")
}

/// `invoiceLine` → `invoice-line`
pub fn to_kebab_case(input: &str) -> String {
    split_words(input).join("-")
}

/// `invoice_line` → `InvoiceLine`
pub fn to_pascal_case(input: &str) -> String {
    split_words(input).iter().map(|w| capitalize(w)).collect()
}

/// `invoice_line` → `invoiceLine`
pub fn to_camel_case(input: &str) -> String {
    let words = split_words(input);
    let mut out = String::new();
    for (i, word) in words.iter().enumerate() {
        if i == 0 {
            out.push_str(word);
        } else {
            out.push_str(&capitalize(word));
        }
    }
    out
}

/// Exported Go identifier: Pascal case with initialisms in capitals.
///
/// `customer_id` → `CustomerID`, `avatarUrl` → `AvatarURL`.
pub fn to_go_ident(input: &str) -> String {
    split_words(input)
        .iter()
        .map(|w| {
            if GO_INITIALISMS.contains(&w.as_str()) {
                w.to_uppercase()
            } else {
                capitalize(w)
            }
        })
        .collect()
}

/// Unexported Go identifier: the Go identifier with a lowercase head word.
///
/// `customer_id` → `customerID`, `id` → `id`.
pub fn to_go_local(input: &str) -> String {
    let words = split_words(input);
    let mut out = String::new();
    for (i, word) in words.iter().enumerate() {
        if i == 0 {
            out.push_str(word);
        } else if GO_INITIALISMS.contains(&word.as_str()) {
            out.push_str(&word.to_uppercase());
        } else {
            out.push_str(&capitalize(word));
        }
    }
    out
}

/// Go keywords and the names generated method bodies already bind.
const GO_RESERVED: &[&str] = &[
    "break", "c", "case", "chan", "const", "continue", "ctx", "db", "default", "defer", "else",
    "err", "fallthrough", "for", "func", "go", "goto", "if", "import", "interface", "map",
    "opts", "package", "r", "range", "req", "result", "return", "row", "rows", "select",
    "struct", "switch", "type", "u", "var", "w",
];

/// Local variable name that cannot shadow a keyword or a bound name.
///
/// `invoice` → `invoice`, `type` → `typeValue`.
pub fn to_go_var(input: &str) -> String {
    let local = to_go_local(input);
    if GO_RESERVED.contains(&local.as_str()) {
        format!("{local}Value")
    } else {
        local
    }
}

/// English plural with the single irregular rule the generator knows.
///
/// A trailing `y` becomes `ies`; everything else gets an `s`.
pub fn pluralize(word: &str) -> String {
    match word.strip_suffix('y') {
        Some(stem) => format!("{stem}ies"),
        None => format!("{word}s"),
    }
}

/// Table name: snake case, pluralized on the last word.
pub fn table_name(entity: &str) -> String {
    pluralize(&to_snake_case(entity))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_handles_every_casing() {
        let expected = vec!["invoice", "line"];
        assert_eq!(split_words("invoice_line"), expected);
        assert_eq!(split_words("invoiceLine"), expected);
        assert_eq!(split_words("InvoiceLine"), expected);
        assert_eq!(split_words("invoice-line"), expected);
        assert_eq!(split_words("HTTPServer"), vec!["http", "server"]);
    }

    #[test]
    fn case_conversions() {
        assert_eq!(to_snake_case("createdAt"), "created_at");
        assert_eq!(to_kebab_case("sendInvoice"), "send-invoice");
        assert_eq!(to_pascal_case("invoice_line"), "InvoiceLine");
        assert_eq!(to_camel_case("Invoice_Line"), "invoiceLine");
    }

    #[test]
    fn go_identifiers_uppercase_initialisms() {
        assert_eq!(to_go_ident("customer_id"), "CustomerID");
        assert_eq!(to_go_ident("avatarUrl"), "AvatarURL");
        assert_eq!(to_go_ident("id"), "ID");
        assert_eq!(to_go_ident("name"), "Name");
        assert_eq!(to_go_local("customerId"), "customerID");
        assert_eq!(to_go_local("invoice"), "invoice");
    }

    #[test]
    fn go_vars_avoid_keywords() {
        assert_eq!(to_go_var("invoiceLine"), "invoiceLine");
        assert_eq!(to_go_var("type"), "typeValue");
        assert_eq!(to_go_var("req"), "reqValue");
    }

    #[test]
    fn pluralization_rules() {
        assert_eq!(pluralize("category"), "categories");
        assert_eq!(pluralize("order"), "orders");
        assert_eq!(pluralize("company"), "companies");
        assert_eq!(pluralize("day"), "dies");
    }

    #[test]
    fn table_names_pluralize_the_last_word() {
        assert_eq!(table_name("invoiceLine"), "invoice_lines");
        assert_eq!(table_name("Category"), "categories");
    }
}
