//! HTML-like markup translation to IRC formatting codes.
//!
//! Plugin authors write `<b>bold</b>` or `<c:red>alert</c>` instead of
//! embedding raw control bytes in their strings.

/// Named colors accepted inside `<c:...>` markup, mapped to the mIRC
/// two-digit color codes.
const COLOR_MAP: &[(&str, &str)] = &[
    ("white", "00"),
    ("black", "01"),
    ("blue", "02"),
    ("green", "03"),
    ("red", "04"),
    ("brown", "05"),
    ("purple", "06"),
    ("orange", "07"),
    ("yellow", "08"),
    ("lgreen", "09"),
    ("cyan", "10"),
    ("lcyan", "11"),
    ("lblue", "12"),
    ("pink", "13"),
    ("gray", "14"),
    ("grey", "14"),
    ("lgray", "15"),
    ("lgrey", "15"),
];

fn color_code(name: &str) -> &str {
    COLOR_MAP
        .iter()
        .find(|(n, _)| *n == name)
        .map(|(_, code)| *code)
        .unwrap_or(name)
}

/// Translate markup in `text` to IRC formatting codes.
///
/// Supported tags: `b` (bold), `i` (italic), `u` (underline), `s`
/// (strike-through), `r` (reset), and `c` (color). Color is written
/// `<c:fg>` or `<c:fg,bg>` with either numeric codes or the names in the
/// color table, and closed with `</c>`.
pub fn format(text: &str) -> String {
    let mut out = text
        .replace("<b>", "\x02")
        .replace("</b>", "\x02")
        .replace("<i>", "\x1D")
        .replace("</i>", "\x1D")
        .replace("<u>", "\x1F")
        .replace("</u>", "\x1F")
        .replace("<s>", "\x1E")
        .replace("</s>", "\x1E")
        .replace("<c>", "\x03")
        .replace("</c>", "\x03")
        .replace("<r>", "\x0F");

    while let Some(start) = out.find("<c:") {
        let Some(close) = out[start..].find('>') else {
            break;
        };
        let end = start + close;
        let spec = &out[start + 3..end];

        let mut code = String::from("\x03");
        match spec.split_once(',') {
            Some((fg, bg)) => {
                code.push_str(color_code(fg));
                code.push(',');
                code.push_str(color_code(bg));
            }
            None => code.push_str(color_code(spec)),
        }

        out.replace_range(start..=end, &code);
    }

    out
}
