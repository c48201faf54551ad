//! Theme stylesheet generation and CSS minification.

use pagesmith_model::Theme;

/// Asset pipeline utilities.
pub struct AssetPipeline;

impl AssetPipeline {
    /// Generate the theme stylesheet: custom properties plus base rules that
    /// the emitted page markup relies on.
    pub fn theme_css(theme: &Theme) -> String {
        format!(
            r#":root {{
  --font-family: {font};
  --background-color: {background};
  --text-color: {text};
  --primary-color: {primary};
}}

* {{
  box-sizing: border-box;
}}

body {{
  margin: 0;
  font-family: var(--font-family);
  background: var(--background-color);
  color: var(--text-color);
}}

.empty-page {{
  padding: 4rem 1rem;
  text-align: center;
  opacity: 0.6;
}}

.hero {{
  padding: 4rem 1.5rem;
  text-align: center;
}}

.hero-cta {{
  margin-top: 1.5rem;
  padding: 0.75rem 1.5rem;
  border: none;
  border-radius: 0.375rem;
  background: var(--primary-color);
  color: #fff;
  cursor: pointer;
}}

.card {{
  padding: 1.5rem;
  border: 1px solid rgba(0, 0, 0, 0.1);
  border-radius: 0.5rem;
}}
"#,
            font = theme.font_family,
            background = theme.background_color,
            text = theme.text_color,
            primary = theme.primary_color,
        )
    }

    /// Minify CSS using lightningcss.
    pub fn minify_css(css: &str) -> Result<String, String> {
        use lightningcss::stylesheet::{ParserOptions, PrinterOptions, StyleSheet};

        let stylesheet = StyleSheet::parse(css, ParserOptions::default())
            .map_err(|e| format!("CSS parse error: {}", e))?;

        let minified = stylesheet
            .to_css(PrinterOptions {
                minify: true,
                ..Default::default()
            })
            .map_err(|e| format!("CSS minify error: {}", e))?;

        Ok(minified.code)
    }
}
