use crate::config::{Casing, SplitConfig};
use crate::syntax::TEST_FILE_SUFFIX;

/// Rules for turning a test name into an output file name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamingPolicy {
    pub output_base: String,
    pub casing: Casing,
    pub test_prefix: String,
}

impl NamingPolicy {
    pub fn from_config(config: &SplitConfig) -> Self {
        Self {
            output_base: config.output_base.clone(),
            casing: config.casing,
            test_prefix: config.test_prefix.clone(),
        }
    }

    /// `TestFooBar` -> `foo_bar` (snake) or `FooBar` (verbatim)
    pub fn derive_name(&self, test_name: &str) -> String {
        let name = test_name
            .strip_prefix(self.test_prefix.as_str())
            .unwrap_or(test_name);
        match self.casing {
            Casing::Snake => snake_case(name),
            Casing::Verbatim => name.to_string(),
        }
    }

    /// `{output_base}_{derived}_test.go`
    pub fn file_name(&self, test_name: &str) -> String {
        format!(
            "{}_{}{TEST_FILE_SUFFIX}",
            self.output_base,
            self.derive_name(test_name)
        )
    }
}

fn is_separator(c: char) -> bool {
    matches!(c, '_' | '-' | '.' | ' ')
}

/// Lowercase words joined by `_`.
///
/// A word starts at a lower-to-upper or digit-to-letter transition, and an
/// uppercase run gives up its last letter when a lowercase letter follows
/// (`HTTPServer` -> `http_server`). Existing separators collapse.
pub fn snake_case(name: &str) -> String {
    let chars: Vec<char> = name.chars().collect();
    let mut words: Vec<String> = Vec::new();
    let mut current = String::new();

    for (i, &c) in chars.iter().enumerate() {
        if is_separator(c) {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            continue;
        }

        let prev = i
            .checked_sub(1)
            .map(|p| chars[p])
            .filter(|p| !is_separator(*p));
        let next = chars.get(i + 1).copied();

        let boundary = match prev {
            None => false,
            Some(p) if c.is_uppercase() => {
                p.is_lowercase()
                    || p.is_ascii_digit()
                    || (p.is_uppercase() && next.is_some_and(char::is_lowercase))
            }
            Some(p) if c.is_alphabetic() => p.is_ascii_digit(),
            Some(_) => false,
        };

        if boundary && !current.is_empty() {
            words.push(std::mem::take(&mut current));
        }
        current.extend(c.to_lowercase());
    }

    if !current.is_empty() {
        words.push(current);
    }

    words.join("_")
}
