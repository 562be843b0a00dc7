use std::collections::HashMap;

/// Parse `key=value&flag` pairs from a query string or a form-encoded body.
///
/// Values are percent-decoded and `+` is read as a space. Repeated keys keep
/// the last value.
///
/// # Example
/// ```
/// let params = keebs::core::query_params::parse_pairs("username=typefan%40gmail.com&remember");
/// assert_eq!(params.get("username").map(String::as_str), Some("typefan@gmail.com"));
/// assert_eq!(params.get("remember").map(String::as_str), Some(""));
/// ```
pub fn parse_pairs(input: &str) -> HashMap<String, String> {
    let mut params = HashMap::new();

    for param in input.split('&').filter(|p| !p.is_empty()) {
        match param.split_once('=') {
            Some((key, encoded_value)) => {
                params.insert(decode(key), decode(encoded_value));
            }
            None => {
                params.insert(decode(param), String::new());
            }
        }
    }

    params
}

/// Parse the query part of a URI; a URI without `?` yields no parameters.
pub fn parse_query_params(uri: &str) -> HashMap<String, String> {
    match uri.split_once('?') {
        Some((_, query)) => parse_pairs(query),
        None => HashMap::new(),
    }
}

fn decode(raw: &str) -> String {
    let spaced = raw.replace('+', " ");
    urlencoding::decode(&spaced)
        .map(|v| v.into_owned())
        .unwrap_or(spaced)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn form_body_is_decoded() {
        let params = parse_pairs("username=test%40example.com&password=hunter+2");
        assert_eq!(params["username"], "test@example.com");
        assert_eq!(params["password"], "hunter 2");
    }

    #[test]
    fn query_only_after_question_mark() {
        assert!(parse_query_params("/login").is_empty());
        let params = parse_query_params("/login?mode=signup");
        assert_eq!(params["mode"], "signup");
    }
}
