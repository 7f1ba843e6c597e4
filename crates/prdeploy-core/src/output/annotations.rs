//! GitHub Actions workflow commands (`::error::`, `::notice::`)

/// Escape a message for a workflow command (percent-encoding special chars)
pub fn escape_data(s: &str) -> String {
    s.replace('%', "%25")
        .replace('\r', "%0D")
        .replace('\n', "%0A")
}

/// `::error::` command line for `message`
pub fn error(message: &str) -> String {
    format!("::error::{}", escape_data(message))
}

/// `::notice::` command line for `message`
pub fn notice(message: &str) -> String {
    format!("::notice::{}", escape_data(message))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_data() {
        assert_eq!(escape_data("50% done\r\nnext"), "50%25 done%0D%0Anext");
        assert_eq!(escape_data("plain"), "plain");
    }

    #[test]
    fn test_error_is_single_line() {
        let line = error("Deployment to qa failed: status checks failed.\n\n* lint");
        assert!(line.starts_with("::error::Deployment to qa failed"));
        assert!(!line.contains('\n'));
    }

    #[test]
    fn test_notice() {
        assert_eq!(notice("deployed"), "::notice::deployed");
    }
}
