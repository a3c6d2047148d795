use chardetng::EncodingDetector;
use encoding_rs::Encoding;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum DecodeError {
    #[error("failed to decode page with {encoding}")]
    DecodeFailure { encoding: String },
}

/// Decode a fetched page into UTF-8 using: BOM -> Content-Type charset ->
/// chardetng guess.
pub fn decode_page(bytes: &[u8], content_type: Option<&str>) -> Result<String, DecodeError> {
    if let Some((encoding, _)) = Encoding::for_bom(bytes) {
        return decode_with(bytes, encoding);
    }

    if let Some(enc) = content_type
        .and_then(charset_of)
        .and_then(|label| Encoding::for_label(label.as_bytes()))
    {
        return decode_with(bytes, enc);
    }

    let mut detector = EncodingDetector::new();
    detector.feed(bytes, true);
    decode_with(bytes, detector.guess(None, true))
}

fn charset_of(content_type: &str) -> Option<String> {
    content_type.split(';').find_map(|part| {
        let (key, value) = part.split_once('=')?;
        key.trim()
            .eq_ignore_ascii_case("charset")
            .then(|| value.trim().trim_matches(&['"', '\''][..]).to_string())
    })
}

fn decode_with(bytes: &[u8], enc: &'static Encoding) -> Result<String, DecodeError> {
    let (text, _, had_errors) = enc.decode(bytes);
    if had_errors {
        return Err(DecodeError::DecodeFailure {
            encoding: enc.name().to_string(),
        });
    }
    Ok(text.into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn charset_parameter_is_found_case_insensitively() {
        assert_eq!(
            charset_of("text/html; Charset=\"ISO-8859-1\"").as_deref(),
            Some("ISO-8859-1")
        );
        assert_eq!(charset_of("text/html"), None);
    }

    #[test]
    fn latin1_header_is_honoured() {
        let bytes = b"Site \xe9t\xe9";
        let text = decode_page(bytes, Some("text/html; charset=iso-8859-1")).unwrap();
        assert_eq!(text, "Site été");
    }

    #[test]
    fn bom_wins_over_header() {
        let bytes = b"\xef\xbb\xbfMAR 2024";
        let text = decode_page(bytes, Some("text/html; charset=iso-8859-1")).unwrap();
        assert_eq!(text, "MAR 2024");
    }

    #[test]
    fn invalid_bytes_are_an_error() {
        let err = decode_page(b"ok \xc3\x28", Some("text/html; charset=utf-8")).unwrap_err();
        assert_eq!(
            err,
            DecodeError::DecodeFailure {
                encoding: "UTF-8".into()
            }
        );
    }
}
