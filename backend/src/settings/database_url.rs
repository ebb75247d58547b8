//! PostgreSQL URL normalisation.

const LEGACY_SCHEME: &str = "postgres://";
const SCHEME: &str = "postgresql://";

/// Rewrite a leading `postgres://` scheme to `postgresql://`.
///
/// Only the first occurrence is replaced, and only at the start; every other
/// byte of the URL is preserved.
pub fn normalise_database_url(url: &str) -> String {
    match url.strip_prefix(LEGACY_SCHEME) {
        Some(rest) => format!("{SCHEME}{rest}"),
        None => url.to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(
        "postgres://u:p@db.internal:5432/app?sslmode=require",
        "postgresql://u:p@db.internal:5432/app?sslmode=require"
    )]
    #[case("postgresql://u:p@h/db", "postgresql://u:p@h/db")]
    #[case(
        "postgres://u:postgres://@h/db",
        "postgresql://u:postgres://@h/db"
    )]
    #[case("mysql://h/db", "mysql://h/db")]
    fn only_the_leading_scheme_changes(#[case] raw: &str, #[case] expected: &str) {
        assert_eq!(normalise_database_url(raw), expected);
    }
}
