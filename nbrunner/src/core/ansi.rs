//! ANSI color-code stripping for traceback text.

use std::sync::LazyLock;

use regex::Regex;

static ANSI_COLOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\x1b\[([0-9]{1,3};)*[0-9]{1,3}m").expect("ansi color pattern"));

/// Remove ANSI color escape sequences (`ESC [ <params> ; ... m`) from `text`.
///
/// Kernel tracebacks arrive colorized for terminal display; stripped text is
/// what lands in error artifacts unless the caller asks for raw output.
pub fn strip_colors(text: &str) -> String {
    ANSI_COLOR.replace_all(text, "").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_color_sequences() {
        let colored = "\u{1b}[0;31mZeroDivisionError\u{1b}[0m: division by zero";
        assert_eq!(strip_colors(colored), "ZeroDivisionError: division by zero");
    }

    #[test]
    fn strips_multi_param_sequences() {
        let colored = "\u{1b}[1;32;40mok\u{1b}[0m";
        assert_eq!(strip_colors(colored), "ok");
    }

    #[test]
    fn leaves_plain_text_unchanged() {
        let plain = "Traceback (most recent call last):\n  File \"<stdin>\", line 1";
        assert_eq!(strip_colors(plain), plain);
    }

    #[test]
    fn stripping_is_idempotent() {
        let colored = "\u{1b}[31mboom\u{1b}[0m";
        let once = strip_colors(colored);
        assert_eq!(strip_colors(&once), once);
    }
}
