use crate::id_range::{IdSpan, RangeParser};
use regex::Regex;

/// Name of a scan file decoded into its parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanName {
    pub date: Option<String>,
    /// `None` for digital documents, which have no physical original.
    pub span: Option<IdSpan>,
    pub description: Option<String>,
    pub extension: String,
}

impl ScanName {
    pub fn is_digital(&self) -> bool {
        self.span.is_none()
    }

    pub fn is_pdf(&self) -> bool {
        self.extension.eq_ignore_ascii_case("pdf")
    }
}

/// Maps IDs to filenames and back.
///
/// New scans are named `<prefix><zero-padded id>.<ext>`. Decoding also
/// understands merged documents, `[YYYY-MM-DD_][prefix]<ids>[_<description>].<ext>`,
/// where `<ids>` is a single range token or `d`/`digital`.
#[derive(Debug, Clone)]
pub struct FilenameCodec {
    prefix: String,
    width: usize,
    pattern: Regex,
    extension_pattern: Regex,
}

impl FilenameCodec {
    pub fn new<S: AsRef<str>>(prefix: &str, width: usize, extensions: &[S]) -> Result<Self, regex::Error> {
        let exts = extensions
            .iter()
            .map(|e| regex::escape(e.as_ref().trim_start_matches('.')))
            .collect::<Vec<_>>()
            .join("|");
        let prefix_part = if prefix.is_empty() {
            String::new()
        } else {
            format!("(?:{})?", regex::escape(prefix))
        };
        let pattern = Regex::new(&format!(
            r"^(?:(?P<date>\d{{4}}-\d{{2}}-\d{{2}})_)?{prefix_part}(?P<ids>digital|d|\d+(?:\+\+|\+|-\d+)?)(?:_(?P<desc>.*))?\.(?P<ext>{exts})$"
        ))?;
        let extension_pattern = Regex::new(&format!(r"\.(?:{exts})$"))?;
        Ok(FilenameCodec {
            prefix: prefix.to_string(),
            width,
            pattern,
            extension_pattern,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    /// Filename for a freshly scanned page.
    pub fn encode(&self, id: u32, extension: &str) -> String {
        format!(
            "{}{:0width$}.{}",
            self.prefix,
            id,
            extension.trim_start_matches('.'),
            width = self.width
        )
    }

    /// Filename for an assembled document covering `span`.
    pub fn document_name(
        &self,
        date: Option<&str>,
        span: IdSpan,
        title: Option<&str>,
        extension: &str,
    ) -> String {
        let mut name = span.label(self.width);
        if let Some(date) = date.filter(|d| !d.is_empty()) {
            name = format!("{date}_{name}");
        }
        if let Some(title) = title.map(str::trim).filter(|t| !t.is_empty()) {
            name.push('_');
            name.push_str(&title.replace(['/', '\\'], "-"));
        }
        format!("{name}.{}", extension.trim_start_matches('.'))
    }

    /// Decode a filename. Names that do not follow the scheme are foreign and
    /// yield `None`.
    pub fn decode(&self, name: &str) -> Option<ScanName> {
        let caps = self.pattern.captures(name)?;
        let ids = caps.name("ids")?.as_str();
        let span = match ids {
            "d" | "digital" => None,
            token => Some(RangeParser::default().parse_token(token).ok()?.base_span().ok()?),
        };
        Some(ScanName {
            date: caps.name("date").map(|m| m.as_str().to_string()),
            span,
            description: caps
                .name("desc")
                .map(|m| m.as_str().to_string())
                .filter(|d| !d.is_empty()),
            extension: caps.name("ext")?.as_str().to_string(),
        })
    }

    /// Decode just the ID of a single-page name.
    pub fn decode_id(&self, name: &str) -> Option<u32> {
        self.decode(name)?.span.map(|span| span.first)
    }

    /// True when `name` carries a scan extension, whether or not it decodes.
    pub fn has_scan_extension(&self, name: &str) -> bool {
        self.extension_pattern.is_match(name)
    }
}
