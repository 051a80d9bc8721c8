//! Language name normalization and content sniffing.

/// Normalize a language name or alias to the canonical grammar name.
///
/// Accepts the forms found on code elements: bare names (`py`), class names
/// (`language-python`, `lang-js`) and mixed case. Unknown names are returned
/// lowercased, so providers can still match them directly.
pub fn normalize_language(language: &str) -> String {
    let lowered = language.trim().to_ascii_lowercase();
    let bare = lowered
        .strip_prefix("language-")
        .or_else(|| lowered.strip_prefix("lang-"))
        .unwrap_or(&lowered);

    let canonical = match bare {
        "py" | "py3" | "python3" => "python",
        "js" | "jsx" | "mjs" | "cjs" | "node" => "javascript",
        "ts" | "tsx" | "mts" | "cts" => "typescript",
        "rb" => "ruby",
        "rs" => "rust",
        "sh" | "shell" | "zsh" | "console" => "bash",
        "cs" | "c#" | "c-sharp" => "csharp",
        "c++" | "cxx" | "hpp" | "cc" => "cpp",
        "h" => "c",
        "golang" => "go",
        "mysql" | "postgresql" | "postgres" | "sqlite" | "plsql" => "sql",
        "jsonc" | "json5" => "json",
        "scss" | "less" => "css",
        "php3" | "php7" | "php8" => "php",
        other => other,
    };
    canonical.to_string()
}

/// Detect language from content (shebang lines).
///
/// A recognized interpreter on the first line settles detection outright.
pub fn detect_from_content(content: &str) -> Option<&'static str> {
    let first_line = content.lines().next()?;
    let shebang = first_line.strip_prefix("#!")?.trim();

    if shebang.contains("python") {
        Some("python")
    } else if shebang.contains("node") || shebang.contains("deno") {
        Some("javascript")
    } else if shebang.contains("ruby") {
        Some("ruby")
    } else if shebang.contains("php") {
        Some("php")
    } else if shebang.contains("bash") || shebang.contains("/sh") || shebang.contains("zsh") {
        Some("bash")
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_aliases_and_class_names() {
        assert_eq!(normalize_language("py"), "python");
        assert_eq!(normalize_language("language-js"), "javascript");
        assert_eq!(normalize_language("lang-TS"), "typescript");
        assert_eq!(normalize_language("Rust"), "rust");
        assert_eq!(normalize_language("C++"), "cpp");
        assert_eq!(normalize_language("klingon"), "klingon");
    }

    #[test]
    fn test_detect_shebangs() {
        assert_eq!(detect_from_content("#!/usr/bin/env python3\nprint(1)"), Some("python"));
        assert_eq!(detect_from_content("#!/bin/sh\necho hi"), Some("bash"));
        assert_eq!(detect_from_content("#!/usr/bin/env node\n"), Some("javascript"));
        assert_eq!(detect_from_content("#!/usr/bin/awk -f"), None);
    }

    #[test]
    fn test_no_shebang() {
        assert_eq!(detect_from_content("print(1)"), None);
        assert_eq!(detect_from_content(""), None);
    }
}
