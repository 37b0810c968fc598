use serde::Deserialize;

/// How located logos are removed from the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RemovalMethod {
    /// Paint an opaque white rectangle over the region.
    Cover,
    /// Delete the embedded object; falls back to covering when a bounding box
    /// is known.
    Delete,
}

/// Which unique-image groups the exact-duplicate path removes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    All,
    None,
    /// 1-based group numbers as presented in the ranked group listing.
    Groups(Vec<usize>),
}

#[derive(Debug, Clone, Deserialize)]
pub struct JobFile {
    pub jobs: Vec<Job>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Job {
    pub input: String,
    pub output: String,
    /// Logo template image. Present: template-matching path. Absent:
    /// exact-duplicate path.
    pub template: Option<String>,
    /// 1-based page subset, e.g. `"1, 3, 5-10"`. Absent: all pages.
    #[serde(default, deserialize_with = "deserialize_opt_pages")]
    pub pages: Option<Vec<u32>>,
    pub threshold: Option<f64>,
    pub min_scale: Option<f64>,
    pub max_scale: Option<f64>,
    pub scale_steps: Option<u32>,
    pub method: Option<RemovalMethod>,
    /// Group selection for the exact-duplicate path:
    /// `"all"`, `"none"`, or 1-based group numbers like `"1,3"`.
    pub select: Option<String>,
    /// Directory where each unique image group's representative is saved for
    /// offline inspection.
    pub dump_dir: Option<String>,
    pub dpi: Option<u32>,
}

/// Parse a page-range string into 1-based page numbers.
///
/// Formats:
/// - single page: `"5"`
/// - range: `"5-10"` (5, 6, 7, 8, 9, 10)
/// - mixed, comma-separated: `"1, 3, 5-10, 15"`
///
/// The result is sorted and deduplicated.
pub fn parse_page_range(s: &str) -> crate::error::Result<Vec<u32>> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return Err(crate::error::DelogoError::config("Page range cannot be empty"));
    }

    let mut pages = Vec::new();

    for part in trimmed.split(',') {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }

        if let Some((start_str, end_str)) = part.split_once('-') {
            let start: u32 = start_str.trim().parse().map_err(|_| {
                crate::error::DelogoError::config(format!(
                    "Invalid page number in range: '{start_str}'"
                ))
            })?;
            let end: u32 = end_str.trim().parse().map_err(|_| {
                crate::error::DelogoError::config(format!(
                    "Invalid page number in range: '{end_str}'"
                ))
            })?;

            if start > end {
                return Err(crate::error::DelogoError::config(format!(
                    "Invalid page range: start ({start}) > end ({end})"
                )));
            }

            for page in start..=end {
                pages.push(page);
            }
        } else {
            let page: u32 = part.parse().map_err(|_| {
                crate::error::DelogoError::config(format!("Invalid page number: '{part}'"))
            })?;
            pages.push(page);
        }
    }

    if pages.is_empty() {
        return Err(crate::error::DelogoError::config("Page range resolved to empty set"));
    }

    pages.sort();
    pages.dedup();
    Ok(pages)
}

/// Parse a group selection string: `"all"`, `"none"`, or comma-separated
/// 1-based group numbers.
pub fn parse_selection(s: &str) -> crate::error::Result<Selection> {
    let trimmed = s.trim();
    match trimmed.to_ascii_lowercase().as_str() {
        "all" => return Ok(Selection::All),
        "none" | "" => return Ok(Selection::None),
        _ => {}
    }

    let mut groups = Vec::new();
    for part in trimmed.split(',') {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }
        let idx: usize = part.parse().map_err(|_| {
            crate::error::DelogoError::config(format!("Invalid group number: '{part}'"))
        })?;
        if idx == 0 {
            return Err(crate::error::DelogoError::config(
                "Group numbers are 1-based; 0 is not a valid selection",
            ));
        }
        groups.push(idx);
    }

    if groups.is_empty() {
        return Ok(Selection::None);
    }

    groups.sort();
    groups.dedup();
    Ok(Selection::Groups(groups))
}

/// Page-range deserializer for `pages: Option<String>` job entries.
fn deserialize_opt_pages<'de, D>(deserializer: D) -> Result<Option<Vec<u32>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s: Option<String> = Option::deserialize(deserializer)?;
    match s {
        Some(s) => parse_page_range(&s).map(Some).map_err(serde::de::Error::custom),
        None => Ok(None),
    }
}
