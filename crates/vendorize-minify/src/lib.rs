//! Stylesheet minification passes
//!
//! A fixed sequence of text substitutions applied to prefixed output. The
//! passes are order dependent: zero-value folding expects the space after a
//! colon to still be there, and whitespace around punctuation is only
//! removed near the end.

use std::borrow::Cow;
use std::sync::LazyLock;

use regex::Regex;

macro_rules! pattern {
    ($name:ident, $re:expr) => {
        static $name: LazyLock<Regex> =
            LazyLock::new(|| Regex::new($re).expect(concat!(stringify!($name), " compiles")));
    };
}

pattern!(SPACE_RUNS, r" {2,}");
pattern!(
    ZERO_UNIT,
    r"(?i)([^\\]:|\s)0(?:vmin|vm|vw|vh|rem|em|ex|ch|cm|mm|in|px|pt|pc)\b"
);
pattern!(ZERO_SHORTHAND, r":0(?: 0){1,3}(;|\}| !)");
pattern!(LEADING_ZERO, r"([^\\]:|\s)(-?)0+(\.?\d+)");
pattern!(HEX_COLOR, r"#[0-9a-fA-F]{6}");
pattern!(PUNCTUATION, r"\s*([{:;,]) *");

/// One minification step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pass {
    /// Remove runs of two or more spaces.
    SpaceRuns,
    /// `0px` → `0` after a colon or whitespace.
    ZeroUnits,
    /// `:0 0 0 0;` → `:0;`
    ZeroShorthand,
    /// `0.5` → `.5`, `-0.5` → `-.5`
    LeadingZeros,
    /// `#aabbcc` → `#abc`
    HexColors,
    /// Whitespace around `{ : ; ,`
    Punctuation,
    /// Line breaks and tabs.
    LineBreaks,
}

impl Pass {
    /// Every pass, in the order [`minify`] applies them.
    pub const ALL: [Pass; 7] = [
        Pass::SpaceRuns,
        Pass::ZeroUnits,
        Pass::ZeroShorthand,
        Pass::LeadingZeros,
        Pass::HexColors,
        Pass::Punctuation,
        Pass::LineBreaks,
    ];

    pub fn apply<'a>(self, css: &'a str) -> Cow<'a, str> {
        match self {
            Pass::SpaceRuns => SPACE_RUNS.replace_all(css, ""),
            Pass::ZeroUnits => ZERO_UNIT.replace_all(css, "${1}0"),
            Pass::ZeroShorthand => ZERO_SHORTHAND.replace_all(css, ":0$1"),
            Pass::LeadingZeros => LEADING_ZERO.replace_all(css, "$1$2$3"),
            Pass::HexColors => shorten_hex_colors(css),
            Pass::Punctuation => PUNCTUATION.replace_all(css, "$1"),
            Pass::LineBreaks => {
                if css.contains(['\r', '\n', '\t']) {
                    Cow::Owned(css.replace(['\r', '\n', '\t'], ""))
                } else {
                    Cow::Borrowed(css)
                }
            }
        }
    }
}

/// Run every pass over `css`.
pub fn minify(css: &str) -> String {
    let mut out = css.to_string();
    for pass in Pass::ALL {
        let next = match pass.apply(&out) {
            Cow::Borrowed(_) => continue,
            Cow::Owned(next) => next,
        };
        tracing::trace!(?pass, before = out.len(), after = next.len(), "minify pass");
        out = next;
    }
    out
}

/// `#aabbcc` → `#abc` when every pair repeats (ignoring case), the color is
/// not an attribute value (`=#...`), and it is followed by whitespace, `;`
/// or `}`.
fn shorten_hex_colors(css: &str) -> Cow<'_, str> {
    let mut out = String::new();
    let mut cursor = 0;

    for m in HEX_COLOR.find_iter(css) {
        let preceded_ok = css[..m.start()].chars().next_back().is_some_and(|c| c != '=');
        let followed_ok = css[m.end()..]
            .chars()
            .next()
            .is_some_and(|c| c.is_whitespace() || c == ';' || c == '}');
        if !(preceded_ok && followed_ok) {
            continue;
        }

        let digits = &m.as_str().as_bytes()[1..];
        let repeats = digits
            .chunks(2)
            .all(|pair| pair[0].eq_ignore_ascii_case(&pair[1]));
        if !repeats {
            continue;
        }

        out.push_str(&css[cursor..m.start()]);
        out.push('#');
        out.extend(digits.chunks(2).map(|pair| pair[0] as char));
        cursor = m.end();
    }

    if cursor == 0 {
        return Cow::Borrowed(css);
    }
    out.push_str(&css[cursor..]);
    Cow::Owned(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_space_runs() {
        assert_eq!(Pass::SpaceRuns.apply("a  b   c d"), "abc d");
    }

    #[test]
    fn test_zero_units() {
        assert_eq!(Pass::ZeroUnits.apply("margin: 0px 0em;"), "margin: 0 0;");
        assert_eq!(Pass::ZeroUnits.apply("width:0vmin;"), "width:0;");
        assert_eq!(Pass::ZeroUnits.apply("top: 10px;"), "top: 10px;");
        // keyframe selectors keep their percent
        assert_eq!(Pass::ZeroUnits.apply(" 0% {top:0}"), " 0% {top:0}");
        // escaped colons are left alone
        assert_eq!(Pass::ZeroUnits.apply(r".a\:0px"), r".a\:0px");
    }

    #[test]
    fn test_zero_shorthand() {
        assert_eq!(Pass::ZeroShorthand.apply("margin:0 0 0 0;"), "margin:0;");
        assert_eq!(Pass::ZeroShorthand.apply("margin:0 0}"), "margin:0}");
        assert_eq!(Pass::ZeroShorthand.apply("margin:0 0 !important;"), "margin:0 !important;");
        assert_eq!(Pass::ZeroShorthand.apply("margin:0 1px;"), "margin:0 1px;");
    }

    #[test]
    fn test_leading_zeros() {
        assert_eq!(Pass::LeadingZeros.apply("opacity: 0.5;"), "opacity: .5;");
        assert_eq!(Pass::LeadingZeros.apply("margin: -0.5em;"), "margin: -.5em;");
        assert_eq!(Pass::LeadingZeros.apply("z-index:007;"), "z-index:7;");
        assert_eq!(Pass::LeadingZeros.apply("top: 0;"), "top: 0;");
        assert_eq!(Pass::LeadingZeros.apply("width: 100px;"), "width: 100px;");
    }

    #[test]
    fn test_hex_colors() {
        assert_eq!(Pass::HexColors.apply("color: #AAbbCC;"), "color: #Abc;");
        assert_eq!(Pass::HexColors.apply("color: #aabbcd;"), "color: #aabbcd;");
        assert_eq!(Pass::HexColors.apply("a{color:#ffffff}"), "a{color:#fff}");
        assert_eq!(Pass::HexColors.apply("[x=#aabbcc] "), "[x=#aabbcc] ");
        assert_eq!(
            Pass::HexColors.apply("a{color:#112233;background:#445566}"),
            "a{color:#123;background:#456}"
        );
    }

    #[test]
    fn test_punctuation() {
        assert_eq!(
            Pass::Punctuation.apply(".a , .b {\n  color : red ;\n}"),
            ".a,.b{\n  color:red;\n}"
        );
    }

    #[test]
    fn test_full_pipeline() {
        let css = ".a {\n\topacity: 0.5;\n\tmargin: 0px 0px;\n\tcolor: #ffffff;\n}\n";
        assert_eq!(minify(css), ".a{opacity:.5;margin:0 0;color:#fff;}");
    }

    #[test]
    fn test_prefixed_output_survives() {
        let css = ".a { -khtml-opacity: 0.5;-moz-opacity: 0.5;opacity: 0.5; }";
        assert_eq!(
            minify(css),
            ".a{-khtml-opacity:.5;-moz-opacity:.5;opacity:.5;}"
        );
    }
}
