use crate::models::SignalValue;

/// Extracts normalized tokens from a raw signal value
///
/// Accepts any of the shapes clients send: an absent field, a single string,
/// a comma/semicolon/pipe-delimited string, or an array of strings. Tokens
/// are trimmed, title-cased (first letter upper, rest lower), and empty
/// tokens are dropped. Output order follows source order.
///
/// Never fails: any shape that cannot be parsed yields an empty sequence.
pub fn extract(value: Option<&SignalValue>) -> Vec<String> {
    match value {
        None => Vec::new(),
        Some(SignalValue::Text(text)) => split_tokens(text),
        Some(SignalValue::List(items)) => items.iter().flat_map(|item| split_tokens(item)).collect(),
        Some(SignalValue::Other(_)) => Vec::new(),
    }
}

fn split_tokens(raw: &str) -> Vec<String> {
    raw.split([',', ';', '|'])
        .filter_map(normalize)
        .collect()
}

fn normalize(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    let mut chars = trimmed.chars();
    let first = chars.next()?;
    let mut token: String = first.to_uppercase().collect();
    token.extend(chars.flat_map(|c| c.to_lowercase()));
    Some(token)
}
