//! Platform font stacks for body text.
//!
//! The browser resolves fonts from whatever is installed on the host, so the
//! body font-family list is picked per operating system. The table is a best
//! effort policy: the Linux stack names fonts common to desktop distributions
//! and CJK-capable Noto packages, but none are guaranteed to be present.

/// CSS font-family list used on macOS hosts.
pub const MACOS_FONTS: &str =
    r#"-apple-system, BlinkMacSystemFont, "Helvetica Neue", "PingFang TC", "Hiragino Sans", sans-serif"#;

/// CSS font-family list used on Linux hosts.
pub const LINUX_FONTS: &str =
    r#""Noto Sans", "Noto Sans CJK TC", "DejaVu Sans", "Liberation Sans", Ubuntu, sans-serif"#;

/// CSS font-family list used everywhere else.
pub const FALLBACK_FONTS: &str =
    r#""Segoe UI", Roboto, "Microsoft JhengHei", Arial, sans-serif"#;

/// Monospace stack for code, shared by every platform.
pub const MONOSPACE_FONTS: &str =
    r#""SFMono-Regular", Menlo, Consolas, "DejaVu Sans Mono", "Courier New", Courier, monospace"#;

/// Select the body font-family list for an operating system identifier, as
/// reported by [`std::env::consts::OS`].
pub fn font_family_for(os: &str) -> &'static str {
    match os {
        "macos" => MACOS_FONTS,
        "linux" => LINUX_FONTS,
        _ => FALLBACK_FONTS,
    }
}

/// The body font-family list for the host we're running on.
pub fn host_font_family() -> &'static str {
    font_family_for(std::env::consts::OS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn macos_gets_apple_fonts() {
        assert_eq!(font_family_for("macos"), MACOS_FONTS);
        assert!(font_family_for("macos").starts_with("-apple-system"));
    }

    #[test]
    fn linux_gets_linux_fonts() {
        assert_eq!(font_family_for("linux"), LINUX_FONTS);
    }

    #[test]
    fn everything_else_falls_back() {
        for os in ["windows", "freebsd", "android", "ios", ""] {
            assert_eq!(font_family_for(os), FALLBACK_FONTS, "os = {os:?}");
        }
    }

    #[test]
    fn stacks_end_in_generic_family() {
        for stack in [MACOS_FONTS, LINUX_FONTS, FALLBACK_FONTS] {
            assert!(stack.ends_with("sans-serif"));
        }
        assert!(MONOSPACE_FONTS.ends_with("monospace"));
    }
}
