/// Parse a directive argument list into ordered `(label, value)` pairs.
///
/// Accepted formats:
///   - `(source: "image.png", alt: "An image")`
///   - `"Swift"` (unlabeled, stored with an empty label)
///   - `visualStyle: list` (unquoted values run until the next `,`)
///
/// Quoted values accept `\"` and `\\` escapes.
pub fn parse_arguments(input: &str) -> Result<Vec<(String, String)>, String> {
    let trimmed = input.trim();
    let inner = if trimmed.starts_with('(') && trimmed.ends_with(')') {
        &trimmed[1..trimmed.len() - 1]
    } else {
        trimmed
    };

    let chars: Vec<char> = inner.chars().collect();
    let len = chars.len();
    let mut pos = 0;
    let mut arguments = Vec::new();

    while pos < len {
        while pos < len && (chars[pos].is_whitespace() || chars[pos] == ',') {
            pos += 1;
        }
        if pos >= len {
            break;
        }

        // A label is an identifier followed by `:`.
        let label_start = pos;
        let mut scan = pos;
        while scan < len && (chars[scan].is_alphanumeric() || chars[scan] == '_') {
            scan += 1;
        }
        let label_end = scan;
        while scan < len && chars[scan] == ' ' {
            scan += 1;
        }
        let label = if label_end > label_start && scan < len && chars[scan] == ':' {
            pos = scan + 1;
            chars[label_start..label_end].iter().collect()
        } else {
            String::new()
        };

        while pos < len && chars[pos].is_whitespace() {
            pos += 1;
        }
        if pos >= len {
            if label.is_empty() {
                break;
            }
            return Err(format!("missing value for argument '{label}'"));
        }

        let value = if chars[pos] == '"' {
            pos += 1;
            let value_start = pos;
            let mut value = String::new();
            while pos < len && chars[pos] != '"' {
                if chars[pos] == '\\' && pos + 1 < len && matches!(chars[pos + 1], '"' | '\\') {
                    value.push(chars[pos + 1]);
                    pos += 2;
                } else {
                    value.push(chars[pos]);
                    pos += 1;
                }
            }
            if pos >= len {
                return Err(format!(
                    "unterminated quoted value starting at position {}",
                    value_start - 1
                ));
            }
            pos += 1;
            while pos < len && chars[pos].is_whitespace() {
                pos += 1;
            }
            if pos < len && chars[pos] != ',' {
                return Err(format!(
                    "unexpected character '{}' at position {}",
                    chars[pos], pos
                ));
            }
            value
        } else {
            let value_start = pos;
            while pos < len && chars[pos] != ',' {
                pos += 1;
            }
            chars[value_start..pos].iter().collect::<String>().trim().to_string()
        };

        arguments.push((label, value));
    }

    Ok(arguments)
}
