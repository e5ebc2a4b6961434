//! Tolerant text scanning helpers for vendor pages.
//!
//! Pages arrive as HTML or as plain text copied out of a datasheet. Both are
//! flattened into trimmed, whitespace-collapsed lines before any matching.

/// Flatten HTML (or plain text) into non-empty normalized lines.
pub fn normalize_lines(raw: &str) -> Vec<String> {
    let text = strip_tags(raw);
    let text = decode_entities(&text);
    text.lines()
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|line| !line.is_empty())
        .collect()
}

fn strip_tags(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let lower = raw.to_ascii_lowercase();
    let mut i = 0;
    while i < raw.len() {
        let rest = &raw[i..];
        if starts_tag(rest) {
            // drop script/style bodies entirely
            let skip_to = ["script", "style"].iter().find_map(|tag| {
                let open = format!("<{}", tag);
                if lower[i..].starts_with(&open) {
                    let close = format!("</{}", tag);
                    lower[i..].find(&close).map(|p| i + p)
                } else {
                    None
                }
            });
            if let Some(pos) = skip_to {
                i = pos;
            }
            match raw[i..].find('>') {
                Some(end) => {
                    out.push('\n');
                    i += end + 1;
                }
                None => {
                    out.push_str(&raw[i..]);
                    break;
                }
            }
        } else {
            let ch = match rest.chars().next() {
                Some(c) => c,
                None => break,
            };
            out.push(ch);
            i += ch.len_utf8();
        }
    }
    out
}

/// `<` opens a tag only before a letter, `/`, `!` or `?`; `fHCLK < 80 MHz`
/// stays text.
fn starts_tag(rest: &str) -> bool {
    let mut chars = rest.chars();
    chars.next() == Some('<')
        && chars
            .next()
            .map_or(false, |c| c.is_ascii_alphabetic() || matches!(c, '/' | '!' | '?'))
}

fn decode_entities(text: &str) -> String {
    text.replace("&nbsp;", " ")
        .replace("&#160;", " ")
        .replace("&deg;", "°")
        .replace("&#176;", "°")
        .replace("&minus;", "-")
        .replace('\u{2212}', "-")
        .replace('\u{2013}', "-")
        .replace("&ndash;", "-")
        .replace("&plusmn;", "±")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}

/// Byte offsets of `word` in `haystack` (both lower-case) at word boundaries.
pub fn find_word(haystack: &str, word: &str) -> Vec<usize> {
    let mut hits = Vec::new();
    let mut from = 0;
    while let Some(pos) = haystack[from..].find(word) {
        let start = from + pos;
        let end = start + word.len();
        let before_ok = haystack[..start]
            .chars()
            .next_back()
            .map_or(true, |c| !c.is_alphanumeric());
        let after_ok = haystack[end..]
            .chars()
            .next()
            .map_or(true, |c| !c.is_alphanumeric());
        if before_ok && after_ok {
            hits.push(start);
        }
        from = start + word.len().max(1);
    }
    hits
}

/// Candidate values for any of `labels`: the text after the label on its
/// line, or the following line when the label stands alone.
pub fn label_values(lines: &[String], labels: &[&str]) -> Vec<String> {
    let mut values = Vec::new();
    for (idx, line) in lines.iter().enumerate() {
        let lower = line.to_ascii_lowercase();
        for label in labels {
            for start in find_word(&lower, label) {
                let after = line[start + label.len()..]
                    .trim_start_matches(|c: char| c.is_whitespace() || c == ':' || c == '=')
                    .trim();
                if !after.is_empty() {
                    values.push(after.to_string());
                } else if line[..start].trim().is_empty() {
                    if let Some(next) = lines.get(idx + 1) {
                        values.push(next.clone());
                    }
                }
            }
        }
    }
    values
}

/// Every number in `text`. A `-` counts as a sign only when it starts a
/// token, so `1.71-3.6` reads as two positive numbers.
pub fn numbers(text: &str) -> Vec<(f64, usize)> {
    let chars: Vec<(usize, char)> = text.char_indices().collect();
    let mut out = Vec::new();
    let mut i = 0;
    while i < chars.len() {
        let (pos, c) = chars[i];
        let signed = (c == '-' || c == '+')
            && chars.get(i + 1).map_or(false, |(_, n)| n.is_ascii_digit())
            && (i == 0 || {
                let prev = chars[i - 1].1;
                !prev.is_alphanumeric() && prev != '.' && prev != '-'
            });
        if c.is_ascii_digit() || signed {
            i += 1;
            let mut seen_point = false;
            while i < chars.len() {
                let c = chars[i].1;
                if c.is_ascii_digit() {
                    i += 1;
                } else if c == '.' {
                    seen_point = true;
                    i += 1;
                } else if c == ',' && !seen_point && is_thousands_group(&chars, i) {
                    i += 4;
                } else {
                    break;
                }
            }
            let end_byte = chars.get(i).map_or(text.len(), |(p, _)| *p);
            let literal = text[pos..end_byte].trim_end_matches('.');
            if let Ok(value) = literal.replace(',', "").parse::<f64>() {
                out.push((value, pos + literal.len()));
            }
        } else {
            i += 1;
        }
    }
    out
}

/// A `,` at `at` separating a digit from exactly three more digits.
fn is_thousands_group(chars: &[(usize, char)], at: usize) -> bool {
    let digit = |k: usize| chars.get(k).map_or(false, |(_, c)| c.is_ascii_digit());
    at > 0 && digit(at - 1) && digit(at + 1) && digit(at + 2) && digit(at + 3) && !digit(at + 4)
}

/// Parse `256 KB`, `1 Mbyte`, `262144 bytes` into bytes. Bare numbers
/// without a unit are rejected.
pub fn parse_size(text: &str) -> Option<u64> {
    for (value, end) in numbers(text) {
        if value < 0.0 {
            continue;
        }
        let unit: String = text[end..]
            .trim_start()
            .chars()
            .take_while(|c| c.is_ascii_alphabetic())
            .collect::<String>()
            .to_lowercase();
        let factor = match unit.as_str() {
            "kb" | "kbyte" | "kbytes" | "kib" | "k" => 1024.0,
            "mb" | "mbyte" | "mbytes" | "mib" | "m" => 1024.0 * 1024.0,
            "b" | "byte" | "bytes" => 1.0,
            _ => continue,
        };
        return Some((value * factor).floor() as u64);
    }
    None
}

/// The first two numbers in `text` as (min, max), in reading order.
pub fn parse_range(text: &str) -> (Option<f64>, Option<f64>) {
    let nums = numbers(text);
    (nums.first().map(|n| n.0), nums.get(1).map(|n| n.0))
}

/// Parse `80 MHz` / `1.2 GHz` / `32768 Hz` into hertz.
pub fn parse_frequency(text: &str) -> Option<u64> {
    for (value, end) in numbers(text) {
        if value <= 0.0 {
            continue;
        }
        let unit: String = text[end..]
            .trim_start()
            .chars()
            .take_while(|c| c.is_ascii_alphabetic())
            .collect::<String>()
            .to_lowercase();
        let factor = match unit.as_str() {
            "ghz" => 1e9,
            "mhz" => 1e6,
            "khz" => 1e3,
            "hz" => 1.0,
            _ => continue,
        };
        return Some((value * factor).round() as u64);
    }
    None
}

pub fn first_integer(text: &str) -> Option<u32> {
    numbers(text)
        .into_iter()
        .find(|(v, _)| *v >= 0.0 && v.fract() == 0.0)
        .map(|(v, _)| v as u32)
}

/// Alphanumeric tokens (with `-`/`+` kept inside) in source order.
pub fn tokens(text: &str) -> impl Iterator<Item = &str> {
    text.split(|c: char| !(c.is_ascii_alphanumeric() || c == '-' || c == '+'))
        .map(|t| t.trim_matches(|c| c == '-' || c == '+'))
        .filter(|t| !t.is_empty())
}
