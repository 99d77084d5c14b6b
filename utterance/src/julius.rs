//! Parsing of Julius module-mode recognition output.
//!
//! A recognition result arrives as an XML-ish block:
//!
//! ```text
//! <RECOGOUT>
//!   <SHYPO RANK="1" SCORE="-3260.1">
//!     <WHYPO WORD="電気" CLASSID="電気" PHONE="d e N k i" CM="0.981"/>
//!     <WHYPO WORD="つけ" CLASSID="つけ" PHONE="ts u k e" CM="0.944"/>
//!   </SHYPO>
//! </RECOGOUT>
//! ```

use once_cell::sync::Lazy;
use regex::Regex;

static WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r#"WORD="([^"]+)""#).unwrap());

const RECOGOUT_END: &str = "</RECOGOUT>";

/// Extracts the `WORD` attribute of every hypothesis word, in order.
/// Empty attributes are skipped.
pub fn parse_words(buffer: &str) -> Vec<String> {
    WORD.captures_iter(buffer)
        .map(|c| c[1].to_string())
        .collect()
}

/// Reports whether `buffer` holds a complete `<RECOGOUT>` block.
pub fn is_complete(buffer: &str) -> bool {
    buffer.contains(RECOGOUT_END)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"<STARTRECOG/>
<ENDRECOG/>
<INPUTPARAM FRAMES="178" MSEC="1780"/>
<RECOGOUT>
  <SHYPO RANK="1" SCORE="-3260.1">
    <WHYPO WORD="" CLASSID="<s>" PHONE="silB" CM="0.000"/>
    <WHYPO WORD="電気" CLASSID="電気" PHONE="d e N k i" CM="0.981"/>
    <WHYPO WORD="つけ" CLASSID="つけ" PHONE="ts u k e" CM="0.944"/>
    <WHYPO WORD="て" CLASSID="て" PHONE="t e" CM="0.902"/>
    <WHYPO WORD="ください" CLASSID="ください" PHONE="k u d a s a i" CM="0.871"/>
  </SHYPO>
</RECOGOUT>
"#;

    #[test]
    fn words_in_order() {
        assert_eq!(parse_words(SAMPLE), vec!["電気", "つけ", "て", "ください"]);
    }

    #[test]
    fn completeness() {
        assert!(is_complete(SAMPLE));
        let partial = &SAMPLE[..SAMPLE.find("</SHYPO>").unwrap()];
        assert!(!is_complete(partial));
        assert_eq!(parse_words(partial).len(), 4);
    }

    #[test]
    fn no_words() {
        assert!(parse_words("<RECOGOUT></RECOGOUT>").is_empty());
        assert!(parse_words("").is_empty());
    }
}
