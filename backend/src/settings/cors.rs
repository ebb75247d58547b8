//! Origin and host lists derived from settings.

const ANY: &str = "*";

/// Split a `BACKEND_CORS_ORIGINS` value into origins.
///
/// `"*"` and the empty string mean any origin. A comma-separated value is
/// split, trimmed and stripped of empty parts; any other value is a single
/// origin kept as written.
pub fn parse_cors_origins(raw: &str) -> Vec<String> {
    if raw == ANY || raw.is_empty() {
        return vec![ANY.to_owned()];
    }
    if raw.contains(',') {
        return raw
            .split(',')
            .map(str::trim)
            .filter(|origin| !origin.is_empty())
            .map(str::to_owned)
            .collect();
    }
    vec![raw.to_owned()]
}

/// Hosts accepted by the trusted-host filter.
pub fn allowed_hosts(debug: bool, production: bool) -> Vec<String> {
    if debug || production {
        vec![ANY.to_owned()]
    } else {
        vec!["localhost".to_owned(), "127.0.0.1".to_owned()]
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("*", &["*"])]
    #[case("", &["*"])]
    #[case("https://a.com, https://b.com", &["https://a.com", "https://b.com"])]
    #[case("https://a.com,, ,https://b.com,", &["https://a.com", "https://b.com"])]
    #[case("https://a.com", &["https://a.com"])]
    fn origins_are_split_on_commas(#[case] raw: &str, #[case] expected: &[&str]) {
        assert_eq!(parse_cors_origins(raw), expected);
    }

    #[rstest]
    #[case(true, false, &["*"])]
    #[case(false, true, &["*"])]
    #[case(false, false, &["localhost", "127.0.0.1"])]
    fn hosts_are_open_outside_local_development(
        #[case] debug: bool,
        #[case] production: bool,
        #[case] expected: &[&str],
    ) {
        assert_eq!(allowed_hosts(debug, production), expected);
    }
}
