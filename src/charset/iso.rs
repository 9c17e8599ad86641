use crate::charset::ascii::SingleByte;

const UPPER_8859_2: [char; 96] = [
    '\u{A0}', 'Ą', '˘', 'Ł', '¤', 'Ľ', 'Ś', '§', '¨', 'Š', 'Ş', 'Ť', 'Ź', '\u{AD}', 'Ž', 'Ż', '°', 'ą',
    '˛', 'ł', '´', 'ľ', 'ś', 'ˇ', '¸', 'š', 'ş', 'ť', 'ź', '˝', 'ž', 'ż', 'Ŕ', 'Á', 'Â', 'Ă', 'Ä',
    'Ĺ', 'Ć', 'Ç', 'Č', 'É', 'Ę', 'Ë', 'Ě', 'Í', 'Î', 'Ď', 'Đ', 'Ń', 'Ň', 'Ó', 'Ô', 'Ő', 'Ö', '×',
    'Ř', 'Ů', 'Ú', 'Ű', 'Ü', 'Ý', 'Ţ', 'ß', 'ŕ', 'á', 'â', 'ă', 'ä', 'ĺ', 'ć', 'ç', 'č', 'é', 'ę',
    'ë', 'ě', 'í', 'î', 'ď', 'đ', 'ń', 'ň', 'ó', 'ô', 'ő', 'ö', '÷', 'ř', 'ů', 'ú', 'ű', 'ü', 'ý',
    'ţ', '˙',
];

const UPPER_8859_15: [char; 96] = [
    '\u{A0}', '¡', '¢', '£', '€', '¥', 'Š', '§', 'š', '©', 'ª', '«', '¬', '\u{AD}', '®', '¯', '°', '±',
    '²', '³', 'Ž', 'µ', '¶', '·', 'ž', '¹', 'º', '»', 'Œ', 'œ', 'Ÿ', '¿', 'À', 'Á', 'Â', 'Ã', 'Ä',
    'Å', 'Æ', 'Ç', 'È', 'É', 'Ê', 'Ë', 'Ì', 'Í', 'Î', 'Ï', 'Ð', 'Ñ', 'Ò', 'Ó', 'Ô', 'Õ', 'Ö', '×',
    'Ø', 'Ù', 'Ú', 'Û', 'Ü', 'Ý', 'Þ', 'ß', 'à', 'á', 'â', 'ã', 'ä', 'å', 'æ', 'ç', 'è', 'é', 'ê',
    'ë', 'ì', 'í', 'î', 'ï', 'ð', 'ñ', 'ò', 'ó', 'ô', 'õ', 'ö', '÷', 'ø', 'ù', 'ú', 'û', 'ü', 'ý',
    'þ', 'ÿ',
];

/// The [ISO/IEC 8859-1](https://en.wikipedia.org/wiki/ISO/IEC_8859-1) charset. Every byte maps
/// to the code point of the same value.
pub static LATIN_1: SingleByte = SingleByte::new("ISO-8859-1", 0x80, &[], &[]);

/// The [ISO/IEC 8859-2](https://en.wikipedia.org/wiki/ISO/IEC_8859-2) charset.
pub static ISO_8859_2: SingleByte = SingleByte::new("ISO-8859-2", 0xA0, &UPPER_8859_2, &[]);

/// The [ISO/IEC 8859-15](https://en.wikipedia.org/wiki/ISO/IEC_8859-15) charset.
pub static ISO_8859_15: SingleByte = SingleByte::new("ISO-8859-15", 0xA0, &UPPER_8859_15, &[]);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::charset::{Charset, EncodeError};

    #[test]
    fn test_latin1_is_identity() {
        let mut out = [0];
        for b in 0..=255u8 {
            assert_eq!(LATIN_1.decode(&[b]), Ok((b as char, 1)));
            assert_eq!(LATIN_1.encode(b as char, &mut out), Ok(1));
            assert_eq!(out[0], b);
        }
        assert_eq!(LATIN_1.encode('€', &mut out), Err(EncodeError::InvalidChar));
    }

    #[test]
    fn test_8859_15_euro() {
        let mut out = [0];
        assert_eq!(ISO_8859_15.decode(b"\xA4"), Ok(('€', 1)));
        assert_eq!(ISO_8859_15.encode('€', &mut out), Ok(1));
        assert_eq!(out, [0xA4]);
        // The currency sign was replaced by the euro sign
        assert_eq!(ISO_8859_15.encode('¤', &mut out), Err(EncodeError::InvalidChar));
        assert_eq!(ISO_8859_2.encode('¤', &mut out), Ok(1));
        assert_eq!(out, [0xA4]);
    }

    #[test]
    fn test_8859_2_letters() {
        assert_eq!(ISO_8859_2.decode(b"\xA1"), Ok(('Ą', 1)));
        assert_eq!(ISO_8859_2.decode(b"\xFF"), Ok(('˙', 1)));
        assert_eq!(ISO_8859_2.decode(b"z"), Ok(('z', 1)));
    }
}
