//! `drawtext` overlay specifications for the title card

/// Escape caption text for a single-quoted `drawtext` value.
///
/// The overlay text is wrapped in single quotes, so an unescaped quote in the
/// sentence would end the value early and break the filter.
pub fn escape_text(text: &str) -> String {
    text.replace('\'', "\\'")
}

/// Font settings shared by every line on the card.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextStyle {
    pub font_size: u32,
    pub font_color: String,
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            font_size: 48,
            font_color: "white".to_string(),
        }
    }
}

/// One horizontally centered line of text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DrawText {
    pub text: String,
    /// Vertical offset from the frame center in pixels; negative moves up.
    pub offset_y: i32,
    pub style: TextStyle,
}

impl DrawText {
    #[must_use]
    pub fn centered(text: impl Into<String>, offset_y: i32, style: TextStyle) -> Self {
        Self {
            text: text.into(),
            offset_y,
            style,
        }
    }

    fn y_expr(&self) -> String {
        match self.offset_y {
            0 => "(h-text_h)/2".to_string(),
            off if off < 0 => format!("(h-text_h)/2-{}", off.unsigned_abs()),
            off => format!("(h-text_h)/2+{off}"),
        }
    }

    /// Render as a `drawtext` filter.
    #[must_use]
    pub fn to_filter(&self) -> String {
        format!(
            "drawtext=text='{text}':fontcolor={color}:fontsize={size}:x=(w-text_w)/2:y={y}",
            text = escape_text(&self.text),
            color = self.style.font_color,
            size = self.style.font_size,
            y = self.y_expr(),
        )
    }
}

/// Join overlays into one `-vf` filter chain.
pub fn filter_chain(overlays: &[DrawText]) -> String {
    overlays
        .iter()
        .map(DrawText::to_filter)
        .collect::<Vec<_>>()
        .join(",")
}
