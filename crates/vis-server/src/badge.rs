//! Flat two-segment SVG badges.

use vis_types::badge_color;

const LABEL_COLOR: &str = "#555";
const HEIGHT: u32 = 20;
const PADDING: u32 = 10;
const CHAR_WIDTH: u32 = 7;

/// Render a badge with `label` on the left and `value` on the right. The
/// value segment is coloured by [`badge_color`] of the label.
pub fn render(label: &str, value: &str) -> String {
    let color = badge_color(label);
    let label_width = text_width(label);
    let value_width = text_width(value);
    let width = label_width + value_width;
    let label_x = label_width * 5;
    let value_x = (label_width + value_width / 2) * 10;
    let label = escape(label);
    let value = escape(value);

    format!(
        r##"<svg xmlns="http://www.w3.org/2000/svg" width="{width}" height="{HEIGHT}" role="img" aria-label="{label}: {value}">
<title>{label}: {value}</title>
<linearGradient id="s" x2="0" y2="100%"><stop offset="0" stop-color="#bbb" stop-opacity=".1"/><stop offset="1" stop-opacity=".1"/></linearGradient>
<clipPath id="r"><rect width="{width}" height="{HEIGHT}" rx="3" fill="#fff"/></clipPath>
<g clip-path="url(#r)">
<rect width="{label_width}" height="{HEIGHT}" fill="{LABEL_COLOR}"/>
<rect x="{label_width}" width="{value_width}" height="{HEIGHT}" fill="{color}"/>
<rect width="{width}" height="{HEIGHT}" fill="url(#s)"/>
</g>
<g fill="#fff" text-anchor="middle" font-family="Verdana,Geneva,DejaVu Sans,sans-serif" font-size="110">
<text x="{label_x}" y="140" transform="scale(.1)">{label}</text>
<text x="{value_x}" y="140" transform="scale(.1)">{value}</text>
</g>
</svg>
"##
    )
}

fn text_width(text: &str) -> u32 {
    text.chars().count() as u32 * CHAR_WIDTH + PADDING
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c => out.push(c),
        }
    }
    out
}
