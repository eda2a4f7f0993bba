//! Small string helpers shared by the parser and the renderers.

use core::fmt;

/// Converts a hyphen-case attribute name to the camelCase property name it
/// sets.
///
/// # Examples
/// ```
/// use tagtree::utils::camelize;
///
/// assert_eq!(camelize("no-data"), "noData");
/// assert_eq!(camelize("isTrue"), "isTrue");
/// ```
#[must_use]
pub fn camelize(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut upper = false;
    for ch in s.chars() {
        if ch == '-' && !out.is_empty() {
            upper = true;
        } else if upper {
            out.push(ch.to_ascii_uppercase());
            upper = false;
        } else {
            out.push(ch);
        }
    }
    out
}

/// Escapes HTML special characters in a string.
///
/// # Examples
/// ```
/// use tagtree::utils::escape;
///
/// assert_eq!(escape("a & b"), "a &amp; b");
/// assert_eq!(escape("a > b"), "a &gt; b");
/// assert_eq!(escape("a < b"), "a &lt; b");
/// assert_eq!(escape("a \" b"), "a &quot; b");
/// assert_eq!(escape("a ' b"), "a &#x27; b");
/// ```
///
/// # Escaped Characters
/// - `&` → `&amp;`
/// - `>` → `&gt;`
/// - `<` → `&lt;`
/// - `"` → `&quot;`
/// - `'` → `&#x27;`
#[must_use]
pub fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    let _ = escape_into(&mut escaped, text);
    escaped
}

/// Writes the escaped HTML representation of `text` into the provided writer.
///
/// Same as [`escape`] without the intermediate allocation; used by the render
/// pass, which streams straight into the output sink.
#[inline]
pub fn escape_into<W: fmt::Write + ?Sized>(writer: &mut W, text: &str) -> fmt::Result {
    let mut last = 0;
    for (idx, ch) in text.char_indices() {
        let replacement = match ch {
            '&' => "&amp;",
            '>' => "&gt;",
            '<' => "&lt;",
            '"' => "&quot;",
            '\'' => "&#x27;",
            _ => continue,
        };
        if last < idx {
            writer.write_str(&text[last..idx])?;
        }
        writer.write_str(replacement)?;
        last = idx + ch.len_utf8();
    }

    if last < text.len() {
        writer.write_str(&text[last..])
    } else {
        Ok(())
    }
}

/// Collapses every run of whitespace into a single space.
///
/// ```
/// use tagtree::utils::condense_whitespace;
///
/// assert_eq!(condense_whitespace("a \n\t b  "), "a b ");
/// ```
#[must_use]
pub fn condense_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_space = false;
    for ch in text.chars() {
        if ch.is_whitespace() {
            if !in_space {
                out.push(' ');
            }
            in_space = true;
        } else {
            out.push(ch);
            in_space = false;
        }
    }
    out
}

/// Whether `s` is a valid identifier: a letter or underscore followed by
/// letters, digits, underscores or hyphens.
#[must_use]
pub fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-'))
}
