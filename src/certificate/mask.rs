//! Presentation masking for addresses and hashes

/// Characters kept at the start, including the `0x` prefix
pub const MASK_HEAD: usize = 6;

/// Characters kept at the end
pub const MASK_TAIL: usize = 4;

const ELLIPSIS: char = '…';

/// Render `value` as `first…last`. Values too short to hide anything are
/// returned unchanged.
pub fn mask(value: &str) -> String {
    let chars: Vec<char> = value.chars().collect();
    if chars.len() <= MASK_HEAD + MASK_TAIL + 1 {
        return value.to_string();
    }
    let head: String = chars[..MASK_HEAD].iter().collect();
    let tail: String = chars[chars.len() - MASK_TAIL..].iter().collect();
    format!("{}{}{}", head, ELLIPSIS, tail)
}
