//! Built-in language table.
//!
//! The order of [`BUILTIN_LANGUAGES`] is the auto-detection order: on equal
//! relevance the earlier language wins, so general languages come before the
//! dialects that extend them (JavaScript before TypeScript, C before C++).

use crate::detect::normalize_language;
use crate::lexer::{LexicalConfig, LexicalGrammar};
use crate::{Grammar, GrammarProvider};

const C_CONTROL: &[&str] = &[
    "if", "else", "for", "while", "do", "return", "break", "continue", "switch", "case",
    "default", "goto",
];

pub static PYTHON: LexicalConfig = LexicalConfig {
    name: "python",
    aliases: &["py", "gyp"],
    keywords: &[
        "def", "class", "import", "from", "as", "with", "lambda", "pass", "global", "nonlocal",
        "del", "async", "await", "yield", "in", "is", "not", "and", "or", "assert",
    ],
    control_keywords: &[
        "if", "elif", "else", "for", "while", "return", "break", "continue", "try", "except",
        "finally", "raise",
    ],
    types: &["int", "str", "float", "list", "dict", "set", "tuple", "bool", "bytes"],
    builtins: &["True", "False", "None", "self", "print", "len", "range"],
    line_comments: &["#"],
    strings: &["\"\"\"", "'''", "\"", "'"],
    multiline_strings: &["\"\"\"", "'''"],
    attribute_prefix: Some(b'@'),
    capitalized_types: true,
    hints: &["def ", "elif ", "self.", "__init__", "__name__", "print("],
    illegal: &["&&", "||", "};", "==="],
    ..LexicalConfig::BASE
};

const JS_KEYWORDS: &[&str] = &[
    "var", "let", "const", "function", "class", "new", "this", "typeof", "instanceof", "delete",
    "void", "import", "export", "from", "async", "await", "yield", "extends", "super", "static",
    "of", "in",
];
const JS_CONTROL: &[&str] = &[
    "if", "else", "for", "while", "do", "return", "break", "continue", "switch", "case",
    "default", "try", "catch", "finally", "throw",
];
const JS_BUILTINS: &[&str] = &[
    "true", "false", "null", "undefined", "NaN", "Infinity", "console", "window", "document",
];
const JS_TYPES: &[&str] = &[
    "Array", "Object", "String", "Number", "Boolean", "Promise", "Map", "Set", "JSON", "Math",
];

pub static JAVASCRIPT: LexicalConfig = LexicalConfig {
    name: "javascript",
    aliases: &["js", "jsx"],
    keywords: JS_KEYWORDS,
    control_keywords: JS_CONTROL,
    types: JS_TYPES,
    builtins: JS_BUILTINS,
    line_comments: &["//"],
    block_comment: Some(("/*", "*/")),
    strings: &["`", "\"", "'"],
    multiline_strings: &["`"],
    hints: &["function ", "const ", "=>", "console.", "===", "document.", "require("],
    illegal: &["def ", "fn ", ":=", "::"],
    ..LexicalConfig::BASE
};

pub static TYPESCRIPT: LexicalConfig = LexicalConfig {
    name: "typescript",
    aliases: &["ts", "tsx"],
    keywords: &[
        "var", "let", "const", "function", "class", "new", "this", "typeof", "instanceof",
        "delete", "void", "import", "export", "from", "async", "await", "yield", "extends",
        "super", "static", "of", "in", "interface", "type", "enum", "implements", "private",
        "public", "protected", "readonly", "declare", "namespace", "abstract", "keyof",
    ],
    control_keywords: JS_CONTROL,
    types: &["string", "number", "boolean", "any", "unknown", "never", "Array", "Promise"],
    builtins: JS_BUILTINS,
    line_comments: &["//"],
    block_comment: Some(("/*", "*/")),
    strings: &["`", "\"", "'"],
    multiline_strings: &["`"],
    attribute_prefix: Some(b'@'),
    hints: &["interface ", ": string", ": number", ": boolean", "=>", "<T>"],
    illegal: &["def ", "fn ", ":="],
    ..LexicalConfig::BASE
};

pub static JAVA: LexicalConfig = LexicalConfig {
    name: "java",
    aliases: &["jsp"],
    keywords: &[
        "public", "private", "protected", "class", "interface", "extends", "implements",
        "static", "final", "void", "new", "this", "super", "import", "package", "abstract",
        "synchronized", "throws", "instanceof", "enum",
    ],
    control_keywords: &[
        "if", "else", "for", "while", "do", "return", "break", "continue", "switch", "case",
        "default", "try", "catch", "finally", "throw",
    ],
    types: &[
        "int", "long", "short", "byte", "char", "boolean", "float", "double", "String",
    ],
    builtins: &["true", "false", "null"],
    line_comments: &["//"],
    block_comment: Some(("/*", "*/")),
    attribute_prefix: Some(b'@'),
    capitalized_types: true,
    hints: &["public static void main", "System.out", "String[]", "@Override"],
    illegal: &["=>", "#include", "def ", "func ", ":="],
    ..LexicalConfig::BASE
};

const C_KEYWORDS: &[&str] = &[
    "struct", "union", "enum", "typedef", "static", "extern", "const", "volatile", "sizeof",
    "register", "inline",
];
const C_TYPES: &[&str] = &[
    "int", "long", "short", "char", "float", "double", "void", "unsigned", "signed", "size_t",
];

pub static C: LexicalConfig = LexicalConfig {
    name: "c",
    aliases: &["h"],
    keywords: C_KEYWORDS,
    control_keywords: C_CONTROL,
    types: C_TYPES,
    builtins: &["NULL", "EOF", "stdin", "stdout", "stderr"],
    line_comments: &["//"],
    block_comment: Some(("/*", "*/")),
    directive_prefix: Some(b'#'),
    hints: &["#include <stdio.h>", "#include <stdlib.h>", "printf(", "malloc(", "int main("],
    illegal: &["class ", "std::", "namespace ", "template<", "=>", "def "],
    ..LexicalConfig::BASE
};

pub static CPP: LexicalConfig = LexicalConfig {
    name: "cpp",
    aliases: &["c++", "cc", "hpp"],
    keywords: &[
        "struct", "union", "enum", "typedef", "static", "extern", "const", "volatile", "sizeof",
        "register", "inline", "class", "namespace", "template", "typename", "public", "private",
        "protected", "virtual", "override", "new", "delete", "this", "using", "operator",
        "friend", "constexpr", "auto",
    ],
    control_keywords: &[
        "if", "else", "for", "while", "do", "return", "break", "continue", "switch", "case",
        "default", "goto", "try", "catch", "throw",
    ],
    types: &[
        "int", "long", "short", "char", "float", "double", "void", "unsigned", "signed",
        "size_t", "bool", "string", "vector",
    ],
    builtins: &["nullptr", "true", "false", "NULL", "std"],
    line_comments: &["//"],
    block_comment: Some(("/*", "*/")),
    directive_prefix: Some(b'#'),
    hints: &["std::", "#include <iostream>", "cout <<", "template<", "namespace "],
    illegal: &["=>", "def ", "func "],
    ..LexicalConfig::BASE
};

pub static CSHARP: LexicalConfig = LexicalConfig {
    name: "csharp",
    aliases: &["cs", "c#"],
    keywords: &[
        "using", "namespace", "class", "public", "private", "protected", "internal", "static",
        "void", "new", "this", "base", "override", "virtual", "abstract", "sealed", "readonly",
        "var", "async", "await", "interface", "struct", "enum", "get", "set",
    ],
    control_keywords: &[
        "if", "else", "for", "foreach", "while", "do", "return", "break", "continue", "switch",
        "case", "default", "try", "catch", "finally", "throw", "in",
    ],
    types: &[
        "int", "long", "string", "bool", "double", "float", "decimal", "object", "char", "byte",
    ],
    builtins: &["true", "false", "null"],
    line_comments: &["//"],
    block_comment: Some(("/*", "*/")),
    directive_prefix: Some(b'#'),
    capitalized_types: true,
    hints: &[
        "using System",
        "Console.Write",
        "public static void Main",
        "{ get; set; }",
        "foreach (",
    ],
    illegal: &["#include", "def ", "::", ":="],
    ..LexicalConfig::BASE
};

pub static GO: LexicalConfig = LexicalConfig {
    name: "go",
    aliases: &["golang"],
    keywords: &[
        "package", "import", "func", "var", "const", "type", "struct", "interface", "map",
        "chan", "go", "defer", "select", "range",
    ],
    control_keywords: &[
        "if", "else", "for", "return", "break", "continue", "switch", "case", "default", "goto",
        "fallthrough",
    ],
    types: &[
        "int", "int64", "int32", "uint", "string", "bool", "float64", "byte", "rune", "error",
    ],
    builtins: &["nil", "true", "false", "iota", "make", "len", "append", "cap", "new", "panic"],
    line_comments: &["//"],
    block_comment: Some(("/*", "*/")),
    strings: &["`", "\"", "'"],
    multiline_strings: &["`"],
    hints: &["package main", "func ", ":=", "fmt.", "err != nil"],
    illegal: &["=>", "def ", "#include", "::"],
    ..LexicalConfig::BASE
};

pub static RUST: LexicalConfig = LexicalConfig {
    name: "rust",
    aliases: &["rs"],
    keywords: &[
        "fn", "let", "mut", "const", "static", "struct", "enum", "impl", "trait", "pub", "use",
        "mod", "crate", "self", "Self", "super", "where", "as", "type", "dyn", "ref", "move",
        "unsafe", "async", "await", "extern",
    ],
    control_keywords: &[
        "if", "else", "match", "for", "while", "loop", "return", "break", "continue", "in",
    ],
    types: &[
        "i8", "i16", "i32", "i64", "u8", "u16", "u32", "u64", "usize", "isize", "f32", "f64",
        "bool", "char", "str", "String", "Vec", "Option", "Result", "Box",
    ],
    builtins: &["true", "false", "None", "Some", "Ok", "Err"],
    line_comments: &["//"],
    block_comment: Some(("/*", "*/")),
    strings: &["\""],
    multiline_strings: &["\""],
    attribute_prefix: Some(b'#'),
    capitalized_types: true,
    hints: &["fn ", "let mut ", "impl ", "println!", "&self", "pub fn", "::new("],
    illegal: &["def ", "function ", "===", "#include"],
    ..LexicalConfig::BASE
};

pub static PHP: LexicalConfig = LexicalConfig {
    name: "php",
    aliases: &["php3", "php7", "php8"],
    keywords: &[
        "function", "class", "public", "private", "protected", "static", "new", "echo", "print",
        "use", "namespace", "require", "include", "require_once", "array", "extends",
        "implements", "abstract", "interface", "const", "var", "global",
    ],
    control_keywords: &[
        "if", "else", "elseif", "foreach", "for", "while", "do", "return", "break", "continue",
        "switch", "case", "default", "try", "catch", "finally", "throw", "as",
    ],
    builtins: &["true", "false", "null", "TRUE", "FALSE", "NULL"],
    line_comments: &["//", "#"],
    block_comment: Some(("/*", "*/")),
    variable_sigil: Some(b'$'),
    hints: &["<?php", "echo ", "$this->", "?>"],
    illegal: &["def ", ":=", "fn main"],
    ..LexicalConfig::BASE
};

pub static RUBY: LexicalConfig = LexicalConfig {
    name: "ruby",
    aliases: &["rb", "gemspec"],
    keywords: &[
        "def", "class", "module", "end", "do", "self", "require", "include", "attr_accessor",
        "attr_reader", "new", "lambda", "proc", "yield", "super", "alias", "then",
    ],
    control_keywords: &[
        "if", "elsif", "else", "unless", "while", "until", "for", "in", "return", "break",
        "next", "case", "when", "begin", "rescue", "ensure", "raise",
    ],
    builtins: &["true", "false", "nil", "puts"],
    line_comments: &["#"],
    variable_sigil: Some(b'@'),
    capitalized_types: true,
    hints: &["elsif ", "puts ", "do |", ".each", "end\n"],
    illegal: &["#include", "};", "===", "::="],
    ..LexicalConfig::BASE
};

pub static BASH: LexicalConfig = LexicalConfig {
    name: "bash",
    aliases: &["sh", "shell", "zsh"],
    keywords: &[
        "function", "export", "local", "readonly", "declare", "source", "alias", "unset", "echo",
        "read", "cd",
    ],
    control_keywords: &[
        "if", "then", "else", "elif", "fi", "for", "while", "until", "do", "done", "case",
        "esac", "in", "return", "exit", "break", "continue",
    ],
    builtins: &["true", "false"],
    line_comments: &["#"],
    variable_sigil: Some(b'$'),
    hints: &["#!/bin/bash", "fi\n", "done", "esac", "echo ", "$1", "then\n"],
    illegal: &["};", "=>", "::"],
    ..LexicalConfig::BASE
};

pub static SQL: LexicalConfig = LexicalConfig {
    name: "sql",
    aliases: &["mysql", "postgresql", "sqlite"],
    keywords: &[
        "select", "from", "where", "insert", "into", "values", "update", "set", "delete",
        "create", "table", "drop", "alter", "index", "join", "inner", "left", "right", "outer",
        "on", "as", "and", "or", "not", "null", "is", "in", "group", "by", "order", "having",
        "limit", "distinct", "union", "primary", "key", "foreign", "references", "default",
        "view",
    ],
    control_keywords: &["case", "when", "then", "else", "end"],
    types: &[
        "int", "integer", "varchar", "char", "text", "date", "timestamp", "boolean", "decimal",
        "float", "bigint", "serial",
    ],
    builtins: &["true", "false", "count", "sum", "avg", "min", "max", "now"],
    line_comments: &["--"],
    block_comment: Some(("/*", "*/")),
    case_insensitive: true,
    hints: &[
        "SELECT ",
        "INSERT INTO",
        "CREATE TABLE",
        "WHERE ",
        "GROUP BY",
        "ORDER BY",
        "select * from",
    ],
    illegal: &["{", "}", "=>", "def "],
    ..LexicalConfig::BASE
};

pub static CSS: LexicalConfig = LexicalConfig {
    name: "css",
    aliases: &["scss", "less"],
    builtins: &[
        "none", "auto", "inherit", "initial", "block", "inline", "flex", "grid", "bold", "solid",
        "absolute", "relative", "important",
    ],
    block_comment: Some(("/*", "*/")),
    attribute_prefix: Some(b'@'),
    ident_extra: b"-",
    colon_properties: true,
    hints: &["px;", "em;", "color:", "margin:", "padding:", "display:", "font-", "background"],
    illegal: &["=>", "def ", "function ", "==", "return "],
    ..LexicalConfig::BASE
};

pub static JSON: LexicalConfig = LexicalConfig {
    name: "json",
    aliases: &["jsonc"],
    builtins: &["true", "false", "null"],
    strings: &["\""],
    hints: &["{\n  \"", "\": "],
    illegal: &["=", ";", "function ", "def ", "//"],
    ..LexicalConfig::BASE
};

/// Every built-in language, in auto-detection order.
pub static BUILTIN_LANGUAGES: &[&LexicalConfig] = &[
    &PYTHON,
    &JAVASCRIPT,
    &TYPESCRIPT,
    &JAVA,
    &C,
    &CPP,
    &CSHARP,
    &GO,
    &RUST,
    &PHP,
    &RUBY,
    &BASH,
    &SQL,
    &CSS,
    &JSON,
];

/// Provider for the built-in lexical grammars.
///
/// Grammars are plain tables, so all of them are constructed up front.
#[derive(Debug, Clone)]
pub struct BuiltinProvider {
    grammars: Vec<LexicalGrammar>,
}

impl BuiltinProvider {
    pub fn new() -> Self {
        Self {
            grammars: BUILTIN_LANGUAGES
                .iter()
                .copied()
                .map(LexicalGrammar::new)
                .collect(),
        }
    }

    /// Whether a language name or alias resolves to a built-in grammar.
    pub fn supports(&self, language: &str) -> bool {
        self.position(language).is_some()
    }

    fn position(&self, language: &str) -> Option<usize> {
        let name = normalize_language(language);
        self.grammars.iter().position(|grammar| {
            grammar.name() == name || grammar.config().aliases.contains(&name.as_str())
        })
    }
}

impl Default for BuiltinProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl GrammarProvider for BuiltinProvider {
    type Grammar = LexicalGrammar;

    fn get(&mut self, language: &str) -> Option<&mut LexicalGrammar> {
        let index = self.position(language)?;
        self.grammars.get_mut(index)
    }

    fn languages(&self) -> Vec<&'static str> {
        self.grammars.iter().map(|grammar| grammar.name()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_by_name_alias_and_class() {
        let mut provider = BuiltinProvider::new();
        assert_eq!(provider.get("python").map(|g| g.name()), Some("python"));
        assert_eq!(provider.get("py").map(|g| g.name()), Some("python"));
        assert_eq!(
            provider.get("language-javascript").map(|g| g.name()),
            Some("javascript")
        );
        assert_eq!(provider.get("C#").map(|g| g.name()), Some("csharp"));
        assert!(provider.get("cobol").is_none());
    }

    #[test]
    fn test_languages_in_detection_order() {
        let provider = BuiltinProvider::new();
        let languages = provider.languages();
        assert_eq!(languages.len(), 15);
        assert_eq!(languages[0], "python");
        assert_eq!(languages.last(), Some(&"json"));
        let js = languages.iter().position(|l| *l == "javascript");
        let ts = languages.iter().position(|l| *l == "typescript");
        assert!(js < ts);
    }

    #[test]
    fn test_aliases_are_unique() {
        let mut seen = std::collections::HashSet::new();
        for config in BUILTIN_LANGUAGES {
            assert!(seen.insert(config.name), "duplicate {}", config.name);
            for alias in config.aliases {
                assert!(seen.insert(*alias), "duplicate alias {alias}");
            }
        }
    }
}
