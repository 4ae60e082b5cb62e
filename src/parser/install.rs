//! `pip install` output parser
//!
//! On success pip ends with a line such as
//! `Successfully installed charset-normalizer-3.3.2 requests-2.31.0`,
//! listing every distribution it (re)installed as `<name>-<version>`.

use crate::domain::normalize_name;
use regex::Regex;
use std::sync::LazyLock;

/// Marker pip prints when it finished installing distributions
pub const SUCCESS_MARKER: &str = "Successfully installed";

static INSTALLED_LINE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*Successfully installed\s+(.+?)\s*$").unwrap());
// Versions never contain '-', names may.
static NAME_VERSION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(.+)-([^-]+)$").unwrap());

/// A distribution reported by pip as installed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstalledPackage {
    pub name: String,
    pub version: String,
}

/// Returns true if the line carries the success marker
pub fn is_success_line(line: &str) -> bool {
    line.contains(SUCCESS_MARKER)
}

/// Extract the installed distributions from pip output
///
/// Returns `None` if no `Successfully installed` line is present.
pub fn parse_installed(output: &str) -> Option<Vec<InstalledPackage>> {
    let caps = output
        .lines()
        .rev()
        .find_map(|line| INSTALLED_LINE_RE.captures(line))?;
    let installed = caps
        .get(1)?
        .as_str()
        .split_whitespace()
        .filter_map(|token| {
            let caps = NAME_VERSION_RE.captures(token)?;
            Some(InstalledPackage {
                name: caps[1].to_string(),
                version: caps[2].to_string(),
            })
        })
        .collect();
    Some(installed)
}

/// Find the version pip reported installing for `name`
///
/// Names are compared after PEP 503 normalisation.
pub fn installed_version(output: &str, name: &str) -> Option<String> {
    let wanted = normalize_name(name);
    parse_installed(output)?
        .into_iter()
        .find(|pkg| normalize_name(&pkg.name) == wanted)
        .map(|pkg| pkg.version)
}
