//! Voucher code extraction from message text or decoded QR payloads.

use std::sync::LazyLock;

use regex::Regex;

/// Recognized voucher link forms. The first pattern that matches wins and
/// its first capture group is the code.
static PATTERNS: LazyLock<[Regex; 3]> = LazyLock::new(|| {
    [
        Regex::new(r"v=([a-zA-Z0-9]+)").unwrap(),
        Regex::new(r"vouchers/([a-zA-Z0-9]+)").unwrap(),
        Regex::new(r"campaign/\?v=([a-zA-Z0-9]+)").unwrap(),
    ]
});

/// Scan arbitrary text for a voucher code.
///
/// Pure and deterministic: the same input always yields the same result.
/// Codes are case-sensitive alphanumeric tokens.
pub fn extract_voucher_code(text: &str) -> Option<&str> {
    PATTERNS
        .iter()
        .find_map(|pattern| pattern.captures(text))
        .and_then(|captures| captures.get(1))
        .map(|m| m.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    #[test]
    fn extracts_query_parameter_form() {
        let text = "https://gift.truemoney.com/campaign?v=abc123XYZ";
        assert_eq!(extract_voucher_code(text), Some("abc123XYZ"));
    }

    #[test]
    fn extracts_path_segment_form() {
        let text = "see https://gift.truemoney.com/campaign/vouchers/018f2ab3 now";
        assert_eq!(extract_voucher_code(text), Some("018f2ab3"));
    }

    #[test]
    fn extracts_campaign_url_form() {
        let text = "claim it: https://gift.example.com/campaign/?v=AbC123XyZ9";
        assert_eq!(extract_voucher_code(text), Some("AbC123XyZ9"));
    }

    #[test]
    fn first_matching_pattern_wins() {
        // Both the path-segment and query forms appear with different
        // codes; the query pattern is tried first.
        let text = "x/vouchers/AAAA and ?v=BBBB";
        assert_eq!(extract_voucher_code(text), Some("BBBB"));

        // Path segment alone still matches.
        assert_eq!(extract_voucher_code("x/vouchers/AAAA"), Some("AAAA"));
    }

    #[test]
    fn no_code_in_plain_text() {
        assert_eq!(extract_voucher_code("hello world"), None);
        assert_eq!(extract_voucher_code(""), None);
        assert_eq!(extract_voucher_code("v= (nothing follows)"), None);
    }

    #[test]
    fn code_stops_at_non_alphanumeric() {
        let text = "https://gift.truemoney.com/campaign/?v=abc123&utm=x";
        assert_eq!(extract_voucher_code(text), Some("abc123"));
    }

    #[test]
    fn extraction_is_idempotent() {
        let text = "https://gift.truemoney.com/campaign/?v=Zz9Yy8Xx7";
        let first = extract_voucher_code(text);
        let second = extract_voucher_code(text);
        assert_eq!(first, second);
        assert_eq!(first, Some("Zz9Yy8Xx7"));
    }

    #[test]
    fn randomized_embedded_codes_are_recovered() {
        let mut rng = rand::thread_rng();
        // Filler alphabet deliberately excludes '=', '/', and 'v' so the
        // surrounding noise can never form a competing pattern.
        const FILLER: &[u8] = b"abcdfghij KLMNOP 0123 !?.";
        const CODE: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

        for _ in 0..200 {
            let code: String = (0..rng.gen_range(6..24))
                .map(|_| CODE[rng.gen_range(0..CODE.len())] as char)
                .collect();
            let noise = |rng: &mut rand::rngs::ThreadRng| -> String {
                (0..rng.gen_range(0..30))
                    .map(|_| FILLER[rng.gen_range(0..FILLER.len())] as char)
                    .collect()
            };
            let text = format!(
                "{} https://gift.truemoney.com/campaign/?v={} {}",
                noise(&mut rng),
                code,
                noise(&mut rng)
            );
            assert_eq!(extract_voucher_code(&text), Some(code.as_str()), "text: {text}");
        }
    }
}
